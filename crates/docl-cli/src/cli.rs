use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docl_types::Cid;

#[derive(Parser)]
#[command(
    name = "docl",
    about = "DocLedger: content-addressed documents with a verifiable metadata ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to a docl.toml config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(flatten)]
    pub identity: IdentityArgs,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Identity presented to the access gate on writes.
#[derive(Args, Debug)]
pub struct IdentityArgs {
    /// Organization (MSP) id of the caller
    #[arg(long, global = true, default_value = "Org1MSP")]
    pub org: String,
    /// Caller id
    #[arg(long, global = true, default_value = "cli-user")]
    pub caller: String,
    /// Role attribute value, e.g. `admin`
    #[arg(long, global = true)]
    pub role: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a document and record its metadata
    Upload(UploadArgs),
    /// Show a document's metadata and content
    View(ViewArgs),
    /// List every metadata revision of a document
    History(HistoryArgs),
    /// Verify the revision hash chain of a document
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct UploadArgs {
    /// File to upload; `-` or omitted reads stdin
    pub path: Option<PathBuf>,
    /// Upload this text instead of a file
    #[arg(long, conflicts_with = "path")]
    pub text: Option<String>,
}

#[derive(Args)]
pub struct ViewArgs {
    pub cid: Cid,
    /// Write content to this file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub cid: Cid,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub cid: Cid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn upload_with_identity_flags() {
        let cli = Cli::try_parse_from([
            "docl", "--org", "OrgA", "--caller", "alice", "--role", "admin", "upload", "doc.txt",
        ])
        .unwrap();
        assert_eq!(cli.identity.org, "OrgA");
        assert_eq!(cli.identity.caller, "alice");
        assert_eq!(cli.identity.role.as_deref(), Some("admin"));
        match cli.command {
            Command::Upload(args) => assert_eq!(args.path, Some(PathBuf::from("doc.txt"))),
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["docl", "history", "QmDoc", "--format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.identity.org, "Org1MSP");
        assert!(cli.identity.role.is_none());
    }

    #[test]
    fn cid_argument_is_validated() {
        assert!(Cli::try_parse_from(["docl", "view", ""]).is_err());
        let cli = Cli::try_parse_from(["docl", "view", "QmDoc", "-o", "out.bin"]).unwrap();
        match cli.command {
            Command::View(args) => {
                assert_eq!(args.cid.as_str(), "QmDoc");
                assert_eq!(args.output, Some(PathBuf::from("out.bin")));
            }
            _ => panic!("expected view"),
        }
    }

    #[test]
    fn text_and_path_conflict() {
        assert!(Cli::try_parse_from(["docl", "upload", "a.txt", "--text", "hi"]).is_err());
        assert!(Cli::try_parse_from(["docl", "upload", "--text", "hi"]).is_ok());
    }
}
