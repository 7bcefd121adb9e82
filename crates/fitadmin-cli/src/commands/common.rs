use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use fitadmin_core::api::{ContentBackend, HttpContentBackend};
use fitadmin_core::auth::AuthContext;
use fitadmin_core::config::ClientConfig;
use fitadmin_core::editor::{EditorSession, ImageSelection, SubmitReport};
use fitadmin_core::models::{ContentEntity, ContentStep, ImageFile, StepId};
use fitadmin_core::notify::{Notice, NoticeLevel, Notifier};
use fitadmin_core::reconcile::StepImageSync;
use fitadmin_core::routes::{guard, Route, RouteDecision};
use fitadmin_core::{ContentStore, ContentKind};

use crate::auth::restore_auth;
use crate::cli::DocumentArgs;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

/// Prints repository notices to stderr, the terminal's stand-in for toasts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => eprintln!("{}", notice.message),
            NoticeLevel::Error => eprintln!("warning: {}", notice.message),
        }
    }
}

/// A signed-in (or not) profile with its resolved client config.
pub struct Console {
    pub profile_name: String,
    pub config: ClientConfig,
    pub auth: AuthContext,
}

impl Console {
    pub fn open(global_profile: Option<&str>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = profiles.resolve_profile_name(global_profile);
        let config = profiles.client_config(&profile_name)?;
        let auth = restore_auth(&profile_name)?;
        Ok(Self::new(profile_name, config, auth))
    }

    pub const fn new(profile_name: String, config: ClientConfig, auth: AuthContext) -> Self {
        Self {
            profile_name,
            config,
            auth,
        }
    }

    /// Run the route guard before anything is fetched for `route`.
    pub fn enter(&self, route: Route) -> Result<Route, CliError> {
        match guard(route, &self.auth) {
            RouteDecision::Redirect(Route::Login) => {
                Err(CliError::NotSignedIn(self.profile_name.clone()))
            }
            RouteDecision::Allow(route) | RouteDecision::Redirect(route) => {
                tracing::debug!(route = %route, "entering");
                Ok(route)
            }
        }
    }

    pub fn backend(&self) -> Result<HttpContentBackend, CliError> {
        Ok(HttpContentBackend::new(&self.config, self.auth.clone())?)
    }

    pub fn store(&self) -> Result<ContentStore<HttpContentBackend>, CliError> {
        Ok(
            ContentStore::new(Arc::new(self.backend()?), Arc::new(TerminalNotifier))
                .with_offline_demo(self.config.offline_demo),
        )
    }
}

/// Read the content document from `path`, `-` for stdin.
pub fn read_document(path: &Path) -> Result<String, CliError> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().lock().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };
    normalize_content(&raw).ok_or(CliError::EmptyDocument)
}

/// Document from `--file`, piped stdin, or `$EDITOR` seeded with `initial`.
pub fn resolve_document(file: Option<&Path>, initial: &str) -> Result<String, CliError> {
    if let Some(path) = file {
        return read_document(path);
    }
    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }
    capture_editor_input_with_initial(initial)?.ok_or(CliError::EmptyDocument)
}

pub fn parse_document<E: ContentEntity>(raw: &str) -> Result<E, CliError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn render_document<E: ContentEntity>(entity: &E) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(entity)?)
}

/// `--step-image 2=photo.png` as a 1-based position and a path
pub fn parse_step_image(raw: &str) -> Result<(usize, PathBuf), CliError> {
    let invalid = || CliError::InvalidStepImage(raw.to_string());
    let (position, path) = raw.split_once('=').ok_or_else(invalid)?;
    let position = position.trim().parse::<usize>().map_err(|_| invalid())?;
    let path = path.trim();
    if position == 0 || path.is_empty() {
        return Err(invalid());
    }
    Ok((position, PathBuf::from(path)))
}

/// Fill an editor session from a document and the image flags, then save.
pub async fn fill_and_submit<E, B>(
    session: &mut EditorSession<E, B>,
    document: Option<E>,
    input: &DocumentArgs,
    clear_image: bool,
) -> Result<SubmitReport, CliError>
where
    E: ContentEntity,
    B: ContentBackend<E>,
{
    if let Some(document) = document {
        session.apply_document(document).await?;
    }

    if clear_image {
        session.select_image(ImageFile::empty()).await?;
    } else if let Some(path) = &input.image {
        let file = ImageFile::from_path(path).await?;
        if session.select_image(file).await? == ImageSelection::Failed {
            return Err(CliError::Incomplete(format!(
                "Failed to upload {}",
                path.display()
            )));
        }
    }

    for raw in &input.step_images {
        let (position, path) = parse_step_image(raw)?;
        let step_id: StepId = session
            .steps()
            .get(position - 1)
            .map(|step| step.id().clone())
            .ok_or_else(|| CliError::InvalidStepImage(raw.clone()))?;
        let file = ImageFile::from_path(&path).await?;
        if session.attach_step_image(&step_id, file).await? == StepImageSync::Pending {
            tracing::info!(step = position, "step image will upload after saving");
        }
    }

    Ok(session.submit().await?)
}

/// Print the saved id, or fail when the save did not finish.
pub fn finish_submit(kind: ContentKind, report: &SubmitReport) -> Result<(), CliError> {
    if report.navigate_to.is_none() {
        return Err(CliError::Incomplete(describe_incomplete(kind, report)));
    }
    let id = report.id.as_deref().unwrap_or_default();
    if report.persisted {
        println!("{id}");
    } else {
        println!("{id} (kept locally, not saved to the backend)");
    }
    if report.upload_failures > 0 {
        eprintln!(
            "warning: {} image upload(s) did not finish",
            report.upload_failures
        );
    }
    Ok(())
}

pub fn describe_incomplete(kind: ContentKind, report: &SubmitReport) -> String {
    let mut problems = Vec::new();
    if !report.persisted {
        problems.push(format!("the {} itself was not saved", kind.label()));
    }
    if report.step_create_failures > 0 {
        problems.push(format!("{} new step(s) not created", report.step_create_failures));
    }
    if !report.step_updates.failed.is_empty() {
        problems.push(format!(
            "{} of {} step update(s) failed",
            report.step_updates.failed.len(),
            report.step_updates.attempted
        ));
    }
    if report.upload_failures > 0 {
        problems.push(format!("{} image upload(s) failed", report.upload_failures));
    }
    if problems.is_empty() {
        format!("Saving the {} did not finish", kind.label())
    } else {
        format!("Saving the {} did not finish: {}", kind.label(), problems.join("; "))
    }
}

pub fn format_timestamp(timestamp_secs: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp_secs, 0).map_or_else(
        || timestamp_secs.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::Config("ID cannot be empty".to_string()))
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
    let temp_file = create_temp_document_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
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

pub fn create_temp_document_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("fitadmin-{}-{now}.json", std::process::id()))
}
