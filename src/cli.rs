use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thumbforge_common::{CropAnchor, RecordId};

#[derive(Parser)]
#[command(name = "thumbforge")]
#[command(author, version, about = "Derived image cache for stored records")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store an image as a new record and pre-cache its specs
    Add {
        /// Image file to store
        #[arg(required = true)]
        file: PathBuf,

        /// Detail URL the admin thumbnail links to
        #[arg(long)]
        link: Option<String>,

        /// Horizontal crop anchor (left, center, right)
        #[arg(long, default_value = "center")]
        crop_horz: CropAnchor,

        /// Vertical crop anchor (top, center, bottom)
        #[arg(long, default_value = "center")]
        crop_vert: CropAnchor,
    },

    /// Replace a record's source image, invalidating its cached images
    Replace {
        id: RecordId,

        #[arg(required = true)]
        file: PathBuf,
    },

    /// Print the URL of a spec's image, generating it if needed
    Url {
        id: RecordId,

        /// Spec name
        spec: String,
    },

    /// Show a record and the state of its cached images
    Show {
        id: RecordId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored records
    List {
        #[arg(long, default_value = "50")]
        limit: u32,

        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Clear and pre-cache the cached images of one or all records
    Regenerate {
        /// Record to regenerate (all records if omitted)
        id: Option<RecordId>,
    },

    /// Delete the cached images of a record
    ClearCache { id: RecordId },

    /// Delete a record and its cached images
    Delete { id: RecordId },

    /// List the specs of the configured spec module
    Specs,

    /// Validate configuration file and spec module
    Validate {
        /// Config file to validate (uses --config or defaults if not specified)
        file: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        #[arg(default_value = "thumbforge.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display version information
    Version,
}
