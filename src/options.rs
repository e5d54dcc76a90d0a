//! Argument groups shared by the command line and the JSON control mode.
//!
//! Every struct here is both a clap [`Args`] group and a serde [`Deserialize`] target with all
//! fields defaulted, so `gislack gist --list` and
//! `gislack json --json '{"command":"gist","options":{"list":true}}'` land in the same value.
//! Each group is then validated once into a typed operation.

use std::path::{Path, PathBuf};

use clap::Args;
use gislack_core::auth::DEFAULT_PORT;
use gislack_core::error::BuildError;
use gislack_core::options::{present, DoubleSubmitInput};
use gislack_core::request::{GistDraft, GistFile, UploadSource};
use gislack_core::Service;
use serde::Deserialize;

fn usage(command: &str) -> BuildError {
    BuildError::missing(format!("Usage is `gislack {command} --help'"))
}

/// Splits a comma separated list, dropping empty entries.
pub fn split_list(value: &Option<String>) -> Vec<String> {
    present(value)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Options every command accepts for locating files.
pub trait Location {
    fn cfgdirectory(&self) -> Option<String>;
    fn workdir(&self) -> Option<String>;

    /// Directory that relative file paths are resolved against.
    fn resolve_workdir(&self) -> std::io::Result<PathBuf> {
        match self.workdir() {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => std::env::current_dir(),
        }
    }
}

macro_rules! impl_location {
    ($($ty:ty),*) => {
        $(impl Location for $ty {
            fn cfgdirectory(&self) -> Option<String> {
                present(&self.cfgdirectory)
            }
            fn workdir(&self) -> Option<String> {
                present(&self.workdir)
            }
        })*
    };
}

#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GistArgs {
    /// Value is submission title.
    #[arg(long, short = 't')]
    pub title: Option<String>,
    /// Value is submit files, comma separated.
    #[arg(long, short = 'f')]
    pub files: Option<String>,
    /// Names to give the submitted files in the gist, comma separated.
    #[arg(long, visible_alias = "fn")]
    pub filenames: Option<String>,
    /// Submitting as a public. Default is non public.
    #[arg(long, short = 'p')]
    pub public: bool,
    /// Display list of gists.
    #[arg(long, short = 'l')]
    pub list: bool,
    /// Display list of gists as JSON.
    #[arg(long, visible_alias = "lj")]
    pub listasjson: bool,
    /// Get a single gist.
    #[arg(long, short = 'g')]
    pub get: Option<String>,
    /// Value is gist ID. Get history of gist ID.
    #[arg(long, visible_alias = "gh")]
    pub gethistory: Option<String>,
    /// Value is URL for a version. Get version of gist ID.
    #[arg(long, visible_alias = "gv")]
    pub getversion: Option<String>,
    /// Value is gist ID. Files are overwritten.
    #[arg(long, visible_alias = "uo")]
    pub updateoverwrite: Option<String>,
    /// Value is gist ID. Files are added.
    #[arg(long, visible_alias = "ua")]
    pub updateadd: Option<String>,
    /// Value is gist ID to delete.
    #[arg(long, short = 'd')]
    pub delete: Option<String>,
    /// Warning: deletes every gist of the account after confirmation.
    #[arg(long)]
    pub deleteall: bool,
    /// Submit files as anonymous.
    #[arg(long)]
    pub anonymous: bool,
    /// Displays results by JSON parser.
    #[arg(long, short = 'j')]
    pub jsonparser: bool,
    /// Displays simple results.
    #[arg(long, short = 's')]
    pub simpleresult: bool,
    /// Value is path of directory with gislack.cfg.
    #[arg(long, visible_alias = "cfgdir")]
    pub cfgdirectory: Option<String>,
    #[arg(long, hide = true)]
    pub workdir: Option<String>,
}

#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlackArgs {
    /// Value is a file you want to submit.
    #[arg(long, short = 'f')]
    pub file: Option<String>,
    /// Value is a submission channel. Channel name or channel ID.
    #[arg(long, visible_alias = "ch")]
    pub channel: Option<String>,
    /// Value is content strings you want to submit. File is prioritized.
    #[arg(long, visible_alias = "co")]
    pub content: Option<String>,
    /// Value is a submission title.
    #[arg(long, visible_alias = "ti")]
    pub title: Option<String>,
    /// Value is file type.
    #[arg(long, visible_alias = "ft")]
    pub filetype: Option<String>,
    /// Value is initial comment for submission.
    #[arg(long, visible_alias = "ic")]
    pub initialcomment: Option<String>,
    /// Display channel list.
    #[arg(long, visible_alias = "cl")]
    pub channellist: bool,
    /// Display file list.
    #[arg(long, visible_alias = "fl")]
    pub filelist: bool,
    /// Display file list as JSON.
    #[arg(long, visible_alias = "fj")]
    pub filelistasjson: bool,
    /// Value is file ID.
    #[arg(long, visible_alias = "gf")]
    pub getfile: Option<String>,
    /// Value is a submitted user ID. This is used to retrieve file list.
    #[arg(long, short = 'u')]
    pub user: Option<String>,
    /// Display history list for a channel.
    #[arg(long, visible_alias = "hi")]
    pub channelhistory: bool,
    /// Value is a file ID you want to delete.
    #[arg(long, visible_alias = "df")]
    pub deletefile: Option<String>,
    /// Delete every file of the file list, after confirmation.
    #[arg(long, visible_alias = "dfs")]
    pub deletefiles: bool,
    /// Value is a history ID (ts) you want to delete.
    #[arg(long, visible_alias = "dh")]
    pub deletehistory: Option<String>,
    /// Value is number of histories you want to delete, oldest first.
    #[arg(long, visible_alias = "dhs", default_value_t = 0)]
    pub deletehistories: usize,
    /// Displays results by JSON parser.
    #[arg(long, short = 'j')]
    pub jsonparser: bool,
    /// Value is path of directory with gislack.cfg.
    #[arg(long, visible_alias = "cfgdir")]
    pub cfgdirectory: Option<String>,
    #[arg(long, hide = true)]
    pub workdir: Option<String>,
}

#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DoubleSubmitArgs {
    /// Value is submission title for both.
    #[arg(long, short = 't')]
    pub title: Option<String>,
    /// Value is a file for both. Only one file can be uploaded.
    #[arg(long, short = 'f')]
    pub file: Option<String>,
    /// Name to give the file in the gist.
    #[arg(long, visible_alias = "fn")]
    pub filename: Option<String>,
    /// Gist: submitting as a public.
    #[arg(long, short = 'p')]
    pub public: bool,
    /// Value is gist ID. File is overwritten.
    #[arg(long, visible_alias = "uo")]
    pub updateoverwrite: Option<String>,
    /// Value is gist ID. File is added.
    #[arg(long, visible_alias = "ua")]
    pub updateadd: Option<String>,
    /// Slack: value is file type.
    #[arg(long, visible_alias = "ft")]
    pub filetype: Option<String>,
    /// Slack: value is a submission channel.
    #[arg(long, visible_alias = "ch")]
    pub channel: Option<String>,
    /// Slack: value is initial comment.
    #[arg(long, visible_alias = "ic")]
    pub initialcomment: Option<String>,
    /// Displays simple results.
    #[arg(long, short = 's')]
    pub simpleresult: bool,
    /// Displays results by JSON parser.
    #[arg(long, short = 'j')]
    pub jsonparser: bool,
    /// Value is path of directory with gislack.cfg.
    #[arg(long, visible_alias = "cfgdir")]
    pub cfgdirectory: Option<String>,
    #[arg(long, hide = true)]
    pub workdir: Option<String>,
}

#[derive(Args, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthArgs {
    /// Client ID for gist.
    #[arg(long, visible_alias = "gi")]
    pub gistclientid: Option<String>,
    /// Client secret for gist.
    #[arg(long, visible_alias = "gs")]
    pub gistclientsecret: Option<String>,
    /// Client ID for slack.
    #[arg(long, visible_alias = "si")]
    pub slackclientid: Option<String>,
    /// Client secret for slack.
    #[arg(long, visible_alias = "ss")]
    pub slackclientsecret: Option<String>,
    /// Check access token for gist.
    #[arg(long, visible_alias = "cgt")]
    pub chkgisttoken: bool,
    /// Value is port number of the local server receiving the redirect.
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Authorization code for gist, skipping the redirect listener.
    #[arg(long, hide = true)]
    pub gistcode: Option<String>,
    /// Authorization code for slack, skipping the redirect listener.
    #[arg(long, hide = true)]
    pub slackcode: Option<String>,
    /// Value is path of directory with gislack.cfg.
    #[arg(long, visible_alias = "cfgdir")]
    pub cfgdirectory: Option<String>,
    #[arg(long, hide = true)]
    pub workdir: Option<String>,
}

impl Default for AuthArgs {
    fn default() -> Self {
        AuthArgs {
            gistclientid: None,
            gistclientsecret: None,
            slackclientid: None,
            slackclientsecret: None,
            chkgisttoken: false,
            port: DEFAULT_PORT,
            gistcode: None,
            slackcode: None,
            cfgdirectory: None,
            workdir: None,
        }
    }
}

impl_location!(GistArgs, SlackArgs, DoubleSubmitArgs, AuthArgs);

impl From<DoubleSubmitArgs> for DoubleSubmitInput {
    fn from(args: DoubleSubmitArgs) -> Self {
        DoubleSubmitInput {
            title: args.title,
            file: args.file,
            filename: args.filename,
            public: args.public,
            update_overwrite: args.updateoverwrite,
            update_add: args.updateadd,
            filetype: args.filetype,
            channel: args.channel,
            initial_comment: args.initialcomment,
            simple_result: args.simpleresult,
            json_parser: args.jsonparser,
        }
    }
}

/// What a `gist` invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GistOperation {
    List { as_json: bool },
    Get(String),
    History(String),
    Version(String),
    Create { draft: GistDraft, anonymous: bool },
    Update {
        id: String,
        overwrite: bool,
        draft: GistDraft,
    },
    Delete(String),
    DeleteAll,
}

impl GistOperation {
    /// Only the anonymous create runs without a token.
    pub fn needs_token(&self) -> bool {
        !matches!(
            self,
            GistOperation::Create {
                anonymous: true,
                ..
            }
        )
    }
}

fn gist_draft(args: &GistArgs) -> GistDraft {
    let names = split_list(&args.filenames);
    let files = split_list(&args.files)
        .into_iter()
        .enumerate()
        .map(|(i, path)| GistFile {
            path: PathBuf::from(path),
            name: names.get(i).cloned(),
        })
        .collect();
    GistDraft {
        description: present(&args.title).unwrap_or_default(),
        public: args.public,
        files,
    }
}

impl TryFrom<&GistArgs> for GistOperation {
    type Error = BuildError;

    fn try_from(args: &GistArgs) -> Result<Self, Self::Error> {
        let get = present(&args.get);
        let history = present(&args.gethistory);
        let version = present(&args.getversion);
        let title = present(&args.title);
        let files = present(&args.files);
        let update = match (present(&args.updateoverwrite), present(&args.updateadd)) {
            (Some(_), Some(_)) => {
                return Err(BuildError::missing(
                    "use either updateoverwrite or updateadd, not both",
                ))
            }
            (Some(id), None) => Some((id, true)),
            (None, Some(id)) => Some((id, false)),
            (None, None) => None,
        };

        if args.list || args.listasjson {
            return Ok(GistOperation::List {
                as_json: args.listasjson,
            });
        }
        match (get, history) {
            (Some(id), None) => return Ok(GistOperation::Get(id)),
            (None, Some(id)) => return Ok(GistOperation::History(id)),
            (None, None) => {
                if let Some(url) = version {
                    return Ok(GistOperation::Version(url));
                }
            }
            (Some(_), Some(_)) => return Err(usage("gist")),
        }
        if let Some((id, overwrite)) = update {
            if title.is_some() || files.is_some() {
                return Ok(GistOperation::Update {
                    id,
                    overwrite,
                    draft: gist_draft(args),
                });
            }
        } else if title.is_some() && files.is_some() {
            return Ok(GistOperation::Create {
                draft: gist_draft(args),
                anonymous: args.anonymous,
            });
        }
        if let Some(id) = present(&args.delete) {
            return Ok(GistOperation::Delete(id));
        }
        if args.deleteall {
            return Ok(GistOperation::DeleteAll);
        }
        Err(usage("gist"))
    }
}

/// What a `slack` invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlackOperation {
    ChannelList,
    FileList {
        channel: Option<String>,
        user: Option<String>,
        as_json: bool,
    },
    GetFile(String),
    ChannelHistory(String),
    Upload {
        channel: String,
        title: String,
        filetype: String,
        initial_comment: String,
        source: UploadSource,
    },
    DeleteFile(String),
    /// Every file matching the filters.
    DeleteFiles {
        channel: Option<String>,
        user: Option<String>,
    },
    DeleteHistory { channel: String, ts: String },
    /// The `count` oldest messages of a channel, capped at [`MAX_HISTORY_DELETES`].
    DeleteHistories { channel: String, count: usize },
}

/// Upper bound on messages removed by one `deletehistories` run.
pub const MAX_HISTORY_DELETES: usize = 50;

impl TryFrom<&SlackArgs> for SlackOperation {
    type Error = BuildError;

    fn try_from(args: &SlackArgs) -> Result<Self, Self::Error> {
        let channel = present(&args.channel);
        if args.channellist {
            return Ok(SlackOperation::ChannelList);
        }
        if args.filelist || args.filelistasjson {
            return Ok(SlackOperation::FileList {
                channel,
                user: present(&args.user),
                as_json: args.filelistasjson,
            });
        }
        if let Some(id) = present(&args.getfile) {
            return Ok(SlackOperation::GetFile(id));
        }
        if args.channelhistory {
            return channel
                .map(SlackOperation::ChannelHistory)
                .ok_or_else(|| BuildError::missing("channelhistory needs a channel"));
        }
        let source = match (present(&args.file), args.content.clone()) {
            (Some(file), _) => Some(UploadSource::File(PathBuf::from(file))),
            (None, Some(content)) if !content.is_empty() => Some(UploadSource::Content(content)),
            (None, _) => None,
        };
        if let (Some(source), Some(channel)) = (source, channel.clone()) {
            return Ok(SlackOperation::Upload {
                channel,
                title: present(&args.title).unwrap_or_default(),
                filetype: present(&args.filetype).unwrap_or_default(),
                initial_comment: present(&args.initialcomment).unwrap_or_default(),
                source,
            });
        }
        if let Some(id) = present(&args.deletefile) {
            return Ok(SlackOperation::DeleteFile(id));
        }
        if args.deletefiles {
            return Ok(SlackOperation::DeleteFiles {
                channel,
                user: present(&args.user),
            });
        }
        if let Some(ts) = present(&args.deletehistory) {
            return channel
                .map(|channel| SlackOperation::DeleteHistory { channel, ts })
                .ok_or_else(|| BuildError::missing("deletehistory needs a channel"));
        }
        if args.deletehistories > 0 {
            return channel
                .map(|channel| SlackOperation::DeleteHistories {
                    channel,
                    count: args.deletehistories.min(MAX_HISTORY_DELETES),
                })
                .ok_or_else(|| BuildError::missing("deletehistories needs a channel"));
        }
        Err(usage("slack"))
    }
}

/// Client credentials for one service, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPair {
    pub service: Service,
    pub client_id: String,
    pub client_secret: String,
}

/// What an `auth` invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOperation {
    /// Run the redirect flow for every service whose client pair was given.
    Authorize { clients: Vec<ClientPair>, port: u16 },
    /// Trade a code the user already has.
    Exchange {
        service: Service,
        code: String,
        clients: Vec<ClientPair>,
    },
    CheckGistToken,
}

impl AuthArgs {
    pub fn client_pairs(&self) -> Vec<ClientPair> {
        let pair = |service, id: &Option<String>, secret: &Option<String>| {
            Some(ClientPair {
                service,
                client_id: present(id)?,
                client_secret: present(secret)?,
            })
        };
        [
            pair(Service::Gist, &self.gistclientid, &self.gistclientsecret),
            pair(Service::Slack, &self.slackclientid, &self.slackclientsecret),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl TryFrom<&AuthArgs> for AuthOperation {
    type Error = BuildError;

    fn try_from(args: &AuthArgs) -> Result<Self, Self::Error> {
        let clients = args.client_pairs();
        let code = present(&args.gistcode)
            .map(|c| (Service::Gist, c))
            .or_else(|| present(&args.slackcode).map(|c| (Service::Slack, c)));
        if let Some((service, code)) = code {
            return Ok(AuthOperation::Exchange {
                service,
                code,
                clients,
            });
        }
        if !clients.is_empty() {
            return Ok(AuthOperation::Authorize {
                clients,
                port: args.port,
            });
        }
        if args.chkgisttoken {
            return Ok(AuthOperation::CheckGistToken);
        }
        Err(usage("auth"))
    }
}

/// `gislack.cfg` directory: explicit option, then `GISLACK_CFG_PATH`, then `workdir`.
pub fn config_dir(explicit: Option<String>, env_value: Option<String>, workdir: &Path) -> PathBuf {
    explicit
        .or_else(|| env_value.filter(|v| !v.trim().is_empty()))
        .map(PathBuf::from)
        .unwrap_or_else(|| workdir.to_path_buf())
}
