use crate::args::SessionArgs;
use crate::commands::Out;
use crate::session::{self, Session, Status};
use crate::{Config, Result};

/// Runs the interactive session on stdin until `quit` or the end of the input.
///
/// # Errors
/// - `ErrorType::Load` if the file given with `--file` cannot be read.
/// - `ErrorType::Io` if stdin cannot be read.
pub async fn session(config: Config, args: &SessionArgs) -> Result<Out<Status>> {
    let source = args.source().source(&config).await?;
    let output = args
        .output()
        .unwrap_or_else(|| config.output())
        .to_path_buf();
    let mut session = Session::new(config)
        .with_source(source)
        .with_output(output);
    session::run_stdin(&mut session).await?;
    let status = session.status();
    Ok(Out::new(
        format!("The last dashboard is at {}", status.output.display()),
        status,
    ))
}
