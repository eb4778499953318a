use std::{
    io::{self, Read},
    process::ExitCode,
};

use anyhow::{anyhow, bail, Result};
use chartcraft::{
    cli::Cli,
    client::{self, VisualizeClient},
    config::Config,
    printer::{code_block, MarkdownPrinter, TextPrinter},
    server, templates,
};
use is_terminal::IsTerminal;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    init_logging(args.verbose, args.serve);

    let cfg = Config::load();
    debug!(config = %cfg.config_path.display(), "configuration loaded");

    // Template shortcuts
    if args.list_templates {
        for (i, t) in templates::TEMPLATES.iter().enumerate() {
            println!("{}. {:<18} {}", i + 1, t.slug, t.title);
        }
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(name) = &args.show_template {
        let t = templates::find(name).ok_or_else(|| anyhow!("template not found: {}", name))?;
        if cfg.get_bool("PRETTIFY_MARKDOWN") {
            MarkdownPrinter::default().print(&format!("### {}\n\n{}", t.title, code_block(t.language.as_str(), t.code)));
        } else {
            println!("{}", t.code);
        }
        return Ok(ExitCode::SUCCESS);
    }

    if args.serve {
        server::serve(&cfg, args.bind.as_deref()).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let piped = if args.reads_stdin() && !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Some(buf)
    } else {
        None
    };
    let mut workbench = args.build_workbench(&cfg, piped)?;

    if let Some(dir) = &args.download {
        if workbench.code.is_empty() {
            bail!("nothing to download: no code given");
        }
        let path = workbench.save_code(dir)?;
        println!("Saved code to {}", path.display());
    }
    if args.no_submit {
        return Ok(ExitCode::SUCCESS);
    }

    let client = match args.server.as_deref() {
        Some(origin) => VisualizeClient::new(origin, client::request_timeout(&cfg))?,
        None => VisualizeClient::from_config(&cfg)?,
    };

    if !workbench.code.trim().is_empty() {
        eprintln!("Generating visualization...");
    }
    let outcome = client.visualize(&workbench.code, workbench.language).await;
    workbench.record(&outcome);

    match (workbench.chart_url(), workbench.error()) {
        (Some(url), _) => {
            TextPrinter::green().print(url);
            Ok(ExitCode::SUCCESS)
        }
        (None, Some(message)) => {
            TextPrinter::red().eprint(message);
            Ok(ExitCode::FAILURE)
        }
        (None, None) => Err(anyhow!("no visualization and no error recorded")),
    }
}

fn init_logging(verbose: bool, serving: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "chartcraft=debug,tower_http=debug"
    } else if serving {
        "chartcraft=info,tower_http=info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
