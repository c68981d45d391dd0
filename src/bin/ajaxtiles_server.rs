use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use clap::Parser as ClapParser;
use log::{info, LevelFilter};
use rouille::{Server, Request, session::session};

use ajaxtiles::config::SiteConfig;
use ajaxtiles::rouille_view::serve_view;
use ajaxtiles::util::getenv_or;


#[derive(clap::Parser, Debug)]
/// Serve the views of a tiles site configuration, answering Ajax
/// requests with just the requested fragments.
struct Args {
    /// Path to the JSON site configuration
    #[clap(long)]
    config: PathBuf,

    /// Address to listen on (default: $AJAXTILES_LISTEN or
    /// 127.0.0.1:3000)
    #[clap(long)]
    listen: Option<String>,

    /// Also log debugging output
    #[clap(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG still applies on top of this.
    env_logger::Builder::new()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .parse_default_env()
        .init();

    let config = SiteConfig::from_path(&args.config)?;
    let container = Arc::new(config.container()?);
    let views = config.views(container.clone());
    let fragments_param = config.fragments_param().to_string();
    info!("{} definitions, serving {} views",
          container.definition_names().len(), views.len());

    let listen = match args.listen {
        Some(addr) => addr,
        None => getenv_or("AJAXTILES_LISTEN", Some("127.0.0.1:3000"))?,
    };
    let server = Server::new(listen.clone(), move |request: &Request| {
        session(request, "sid", 3600 /*sec*/, |session| {
            serve_view(&views, &fragments_param, request, session)
        })
    }).map_err(|e| anyhow!("can't listen on {listen:?}: {e}"))?;
    info!("listening on {listen}");
    server.run();
    bail!("Server stopped.");
}
