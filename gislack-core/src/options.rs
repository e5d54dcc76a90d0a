//! Typed, validated options handed to the core. The CLI crate turns its permissive
//! argument bags into these values once, at the boundary.

use std::path::PathBuf;

use crate::error::BuildError;

/// Whether a dual submission creates a new gist or updates an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    /// Replace the gist's files: files not being uploaded are deleted.
    UpdateOverwrite(String),
    /// Add or replace the uploaded files, keeping the rest.
    UpdateAdd(String),
}

/// Output shape selected by the `simpleresult` and `jsonparser` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    /// One line with the created time and ID of each submission. No elapsed time.
    Simple,
    /// Indented multi-line JSON.
    Pretty,
    /// Single-line JSON.
    Compact,
}

impl RenderFormat {
    /// `simple` wins over `pretty` when both are set.
    pub fn from_flags(simple: bool, pretty: bool) -> Self {
        match (simple, pretty) {
            (true, _) => RenderFormat::Simple,
            (false, true) => RenderFormat::Pretty,
            (false, false) => RenderFormat::Compact,
        }
    }
}

/// Access tokens read from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// May be empty for anonymous gist submissions.
    pub gist_token: String,
    pub slack_token: String,
}

/// Everything a dual submission needs, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleSubmitOptions {
    pub mode: SubmitMode,
    pub title: String,
    pub file: PathBuf,
    /// Name to give the file in the gist instead of its base name.
    pub filename: Option<String>,
    pub public: bool,
    /// Channel name or ID as given by the user; resolved before building.
    pub channel: String,
    pub filetype: String,
    pub initial_comment: String,
    pub format: RenderFormat,
}

/// Permissive input for [`DoubleSubmitOptions`]: any field may be missing or empty.
#[derive(Debug, Clone, Default)]
pub struct DoubleSubmitInput {
    pub title: Option<String>,
    pub file: Option<String>,
    pub filename: Option<String>,
    pub public: bool,
    pub update_overwrite: Option<String>,
    pub update_add: Option<String>,
    pub filetype: Option<String>,
    pub channel: Option<String>,
    pub initial_comment: Option<String>,
    pub simple_result: bool,
    pub json_parser: bool,
}

/// Treats empty and whitespace-only strings as absent. Present values are kept verbatim.
pub fn present(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

impl TryFrom<DoubleSubmitInput> for DoubleSubmitOptions {
    type Error = BuildError;

    fn try_from(input: DoubleSubmitInput) -> Result<Self, Self::Error> {
        let title = present(&input.title);
        let file = present(&input.file);
        let channel = present(&input.channel).ok_or_else(|| {
            BuildError::missing("a channel is required for the Slack submission")
        })?;

        let mode = match (present(&input.update_overwrite), present(&input.update_add)) {
            (None, None) => {
                if title.is_none() {
                    return Err(BuildError::missing("a title is required to create a gist"));
                }
                SubmitMode::Create
            }
            (Some(id), None) => SubmitMode::UpdateOverwrite(id),
            (None, Some(id)) => SubmitMode::UpdateAdd(id),
            (Some(_), Some(_)) => {
                return Err(BuildError::missing(
                    "use either updateoverwrite or updateadd, not both",
                ))
            }
        };

        let file = file.ok_or_else(|| BuildError::missing("a file is required"))?;

        Ok(DoubleSubmitOptions {
            mode,
            title: title.unwrap_or_default(),
            file: PathBuf::from(file),
            filename: present(&input.filename),
            public: input.public,
            channel,
            filetype: present(&input.filetype).unwrap_or_default(),
            initial_comment: present(&input.initial_comment).unwrap_or_default(),
            format: RenderFormat::from_flags(input.simple_result, input.json_parser),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input() -> DoubleSubmitInput {
        DoubleSubmitInput {
            title: Some("t".into()),
            file: Some("a.txt".into()),
            channel: Some("general".into()),
            ..Default::default()
        }
    }

    #[test]
    fn create_requires_title_file_and_channel() {
        let opts = DoubleSubmitOptions::try_from(create_input()).expect("valid create");
        assert_eq!(opts.mode, SubmitMode::Create);
        assert_eq!(opts.file, PathBuf::from("a.txt"));
        assert_eq!(opts.format, RenderFormat::Compact);

        let mut no_title = create_input();
        no_title.title = Some("   ".into());
        assert!(DoubleSubmitOptions::try_from(no_title).is_err());

        let mut no_channel = create_input();
        no_channel.channel = None;
        assert!(DoubleSubmitOptions::try_from(no_channel).is_err());
    }

    #[test]
    fn update_modes_are_exclusive() {
        let mut add = create_input();
        add.title = None;
        add.update_add = Some("abc".into());
        let opts = DoubleSubmitOptions::try_from(add).expect("valid update");
        assert_eq!(opts.mode, SubmitMode::UpdateAdd("abc".into()));

        let mut both = create_input();
        both.update_add = Some("abc".into());
        both.update_overwrite = Some("abc".into());
        assert!(DoubleSubmitOptions::try_from(both).is_err());
    }

    #[test]
    fn user_text_reaches_the_options_untouched() {
        let mut input = create_input();
        input.title = Some("  Weekly notes ".into());
        input.initial_comment = Some("see below\n".into());
        input.filetype = Some("   ".into());
        let opts = DoubleSubmitOptions::try_from(input).expect("valid create");
        assert_eq!(opts.title, "  Weekly notes ");
        assert_eq!(opts.initial_comment, "see below\n");
        assert_eq!(opts.filetype, "");

        let mut blank = create_input();
        blank.title = Some(" \t".into());
        assert!(DoubleSubmitOptions::try_from(blank).is_err());
    }

    #[test]
    fn simple_takes_precedence_over_pretty() {
        assert_eq!(RenderFormat::from_flags(true, true), RenderFormat::Simple);
        assert_eq!(RenderFormat::from_flags(false, true), RenderFormat::Pretty);
    }
}
