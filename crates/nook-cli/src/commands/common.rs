use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use nook_core::config::SyncSettings;
use nook_core::db::SqliteNoteStore;
use nook_core::services::Notebook;
use nook_core::{Note, NoteId, Principal};
use serde::Serialize;

use crate::config_profiles::{
    default_config_path, trimmed_non_empty, CliProfile, CliProfilesConfig,
};
use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

/// Identity and profile a note command runs under
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub profile_name: String,
    pub profile: CliProfile,
}

impl Session {
    pub fn owner_id(&self) -> &str {
        self.principal.owner_id()
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

pub fn load_session(profile: Option<&str>, token: Option<String>) -> Result<Session, CliError> {
    load_session_from(&default_config_path(), profile, token)
}

/// Resolve the session for `profile`.
///
/// With a token the session is authenticated as the profile's `user_id`.
/// Without one it runs as the profile's guest, generating and saving a guest
/// id on first use.
pub fn load_session_from(
    config_path: &Path,
    profile: Option<&str>,
    token: Option<String>,
) -> Result<Session, CliError> {
    let mut config = CliProfilesConfig::load_from_path(config_path).map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);

    if let Some(token) = trimmed_non_empty(token.as_deref()) {
        let profile = config.profile(&profile_name).cloned().unwrap_or_default();
        let user_id = trimmed_non_empty(profile.user_id.as_deref()).ok_or_else(|| {
            CliError::Config(format!(
                "Profile '{profile_name}' has no user_id; run `nook config init --user-id <ID>` to use a token"
            ))
        })?;
        return Ok(Session {
            principal: Principal::authenticated(user_id, token),
            profile_name,
            profile,
        });
    }

    if config.profile_mut_or_default(&profile_name).ensure_guest_id() {
        config.save_to_path(config_path).map_err(CliError::Config)?;
        tracing::debug!(profile = %profile_name, "Generated guest id");
    }
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    guest_session(profile_name, profile)
}

fn guest_session(profile_name: String, profile: CliProfile) -> Result<Session, CliError> {
    let guest_id = profile
        .guest_id
        .clone()
        .ok_or_else(|| CliError::Config(format!("Profile '{profile_name}' has no guest id")))?;
    Ok(Session {
        principal: Principal::guest(guest_id),
        profile_name,
        profile,
    })
}

/// Remote a session syncs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTarget {
    Server(SyncSettings),
    Directory(PathBuf),
}

/// Sync target for the session.
///
/// An API URL (`NOOK_API_BASE_URL`, else the profile's) selects the sync
/// server. Without one the profile's `sync_dir` is used as a document store.
pub fn resolve_sync_target(session: &Session) -> Result<SyncTarget, CliError> {
    let settings = session
        .profile
        .sync_settings(env::var("NOOK_API_BASE_URL").ok());
    if settings.api_base_url.is_some() {
        return Ok(SyncTarget::Server(settings));
    }
    session
        .profile
        .sync_dir
        .as_deref()
        .and_then(|dir| trimmed_non_empty(Some(dir)))
        .map(|dir| SyncTarget::Directory(PathBuf::from(dir)))
        .ok_or(CliError::SyncNotConfigured)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("NOOK_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nook")
        .join("nook.db")
}

pub fn open_store(path: &Path) -> Result<SqliteNoteStore, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(SqliteNoteStore::open(path)?)
}

pub fn open_notebook(path: &Path) -> Result<Notebook<SqliteNoteStore>, CliError> {
    Ok(Notebook::new(Arc::new(open_store(path)?)))
}

/// Find a note by full id or by a unique id prefix.
pub fn resolve_note(
    note_query: &str,
    notebook: &Notebook<SqliteNoteStore>,
    owner_id: &str,
) -> Result<Note, CliError> {
    if let Ok(note_id) = note_query.parse::<NoteId>() {
        if let Some(note) = notebook.get_note(owner_id, &note_id)? {
            return Ok(note);
        }
    }

    let matching_ids = notebook
        .store()
        .list_ids_by_prefix(owner_id, note_query, 3)?;

    match matching_ids.len() {
        0 => Err(CliError::NoteNotFound(note_query.to_string())),
        1 => {
            let resolved_id = matching_ids[0]
                .parse::<NoteId>()
                .map_err(|_| CliError::NoteNotFound(note_query.to_string()))?;
            notebook
                .get_note(owner_id, &resolved_id)?
                .ok_or_else(|| CliError::NoteNotFound(note_query.to_string()))
        }
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let short_id = short_id(&note.id.to_string());
            let title = truncate_chars(note.display_title(), 24);
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.updated_at, now_ms);
            format!("{short_id:<13}  {title:<24}  {preview:<40}  {relative_time}")
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        created_at: note.created_at,
        updated_at: note.updated_at,
        relative_time: format_relative_time(note.updated_at, now_ms),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = text.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_title(parts: &[String]) -> Result<String, CliError> {
    normalize_content(&parts.join(" ")).ok_or(CliError::EmptyTitle)
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        ))),
        // `EDITOR="code --wait"` and friends
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("nook-note-{}-{now}.md", std::process::id()))
}
