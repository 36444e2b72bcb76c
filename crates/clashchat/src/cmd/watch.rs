use clashchat_session::{
    Dispatch, DispatchRejected, Session, ShutdownHandle, StatusEvent,
};
use clashchat_transport::TcpDialer;
use clashchat_wire::ChatEvent;
use tracing::info;

use crate::cmd::WatchArgs;
use crate::config::ClientConfig;
use crate::exit::{config_error, session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_chat, print_status, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let config =
        ClientConfig::load(&args.config).map_err(|err| config_error("config load failed", err))?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        "attaching to chat server"
    );

    let dialer = TcpDialer::new(config.server.host.clone(), config.server.port);
    let mut session = Session::new(
        dialer,
        config.template,
        config.credentials,
        config.wire,
        config.session,
    );

    install_ctrlc_handler(session.shutdown_handle())?;

    let mut printer = Printer { format };
    match session.run(&mut printer) {
        Ok(()) => Ok(SUCCESS),
        Err(err) => Err(session_error("session failed", err)),
    }
}

struct Printer {
    format: OutputFormat,
}

impl Dispatch for Printer {
    fn on_chat(&mut self, event: ChatEvent) -> Result<(), DispatchRejected> {
        print_chat(&event, self.format);
        Ok(())
    }

    fn on_status(&mut self, status: StatusEvent) {
        print_status(&status, self.format);
    }
}

fn install_ctrlc_handler(handle: ShutdownHandle) -> CliResult<()> {
    ctrlc::set_handler(move || {
        handle.trigger();
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
