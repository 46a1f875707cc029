use clap::Parser;

use crate::fallback::FallbackMode;
use crate::selection::Preference;

#[derive(Parser, Debug)]
#[command(name = "dailies-dl")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Manifest file listing versions and their components
    #[arg(short, long)]
    pub manifest: String,

    /// Output directory
    #[arg(short, long, default_value = "./downloads")]
    pub output: String,

    /// Which representation to prefer
    #[arg(short, long, value_enum, default_value = "encoded")]
    pub prefer: Preference,

    /// Number of parallel transfers per group
    #[arg(short, long, default_value = "4")]
    pub concurrency: usize,

    /// Per-transfer deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// HTTP proxy (e.g., http://127.0.0.1:7890)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Recovery mode for failed items; prompts when omitted
    #[arg(long, value_enum)]
    pub fallback: Option<FallbackMode>,
}
