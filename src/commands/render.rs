use crate::aggregate::Kpis;
use crate::args::RenderArgs;
use crate::commands::Out;
use crate::dashboard::{run_cycle, Cycle};
use crate::loader::SourceCache;
use crate::{Config, Result};

/// Runs one render cycle and writes the page to `--output` (or the configured output).
///
/// # Errors
/// - Returns the cycle's error, after the error page has been written, if the dashboard could not
///   be built.
/// - `ErrorType::Render` if the page cannot be written.
pub async fn render(config: Config, args: &RenderArgs) -> Result<Out<Kpis>> {
    let output = args
        .output()
        .unwrap_or_else(|| config.output())
        .to_path_buf();
    let cycle = match args.source().source(&config).await {
        Ok(source) => {
            let mut cache = SourceCache::new();
            let selection = args.selection().selection();
            run_cycle(&config, &mut cache, &source, &selection).await
        }
        Err(e) => Cycle::failed(&config, e),
    };
    cycle.write(&output).await?;
    let dashboard = cycle.into_result()?;
    Ok(Out::new(
        format!("Dashboard written to {}", output.display()),
        dashboard.aggregates.kpis,
    ))
}
