use clap::{Parser, Subcommand, ValueEnum};
use headline_scrape::renderers::RenderMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "headline-scrape")]
#[command(about = "Extract headline records from news pages and export them as spreadsheets")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract one record and print it as JSON
    Scrape {
        /// Page URL
        url: String,

        /// Rendering backend (overrides the configuration)
        #[arg(short, long, value_enum)]
        mode: Option<RenderModeArg>,
    },

    /// Pivot a JSON array of records into a spreadsheet
    Export {
        /// File holding `[{title, subtitle, link, image, label}, ...]`
        input: PathBuf,

        /// Where to write the workbook
        #[arg(short, long, default_value = "datos.xlsx")]
        output: PathBuf,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on (defaults to $PORT, then 4000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RenderModeArg {
    Static,
    Browser,
    Auto,
}

impl From<RenderModeArg> for RenderMode {
    fn from(arg: RenderModeArg) -> Self {
        match arg {
            RenderModeArg::Static => RenderMode::Static,
            RenderModeArg::Browser => RenderMode::Browser,
            RenderModeArg::Auto => RenderMode::Auto,
        }
    }
}
