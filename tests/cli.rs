use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Stand-in tools: `cat` as formatter, a "typesetter" that copies the source
/// to the expected artifact name, and a "merger" that concatenates its inputs.
const FAKE_TOOLS: &str = r#"
tools:
  formatter:
    program: cat
    args: ["{file}"]
  typesetter:
    program: sh
    args: ["-c", "cp \"$0\" \"${0%.tex}.pdf\"", "{source}"]
  merger:
    program: sh
    args: ["-c", "cat \"$@\" > \"$0\"", "{output}", "{inputs}"]
"#;

const FAILING_ENGINE: &str = r#"
tools:
  formatter:
    program: cat
    args: ["{file}"]
  typesetter:
    program: sh
    args: ["-c", "echo boom; exit 1", "{source}"]
"#;

fn config_file(yaml: &str) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    fs::write(config.path(), yaml).expect("Writing temp config failed");
    config
}

fn submission(root: &Path, relative: &str, files: &[(&str, &str)]) -> std::path::PathBuf {
    let folder = root.join(relative);
    fs::create_dir_all(&folder).unwrap();
    for (name, content) in files {
        fs::write(folder.join(name), content).unwrap();
    }
    folder
}

fn review_cmd(config: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("submission-review").expect("Binary exists");
    cmd.arg("--config").arg(config.path());
    for var in submission_review::load_config::ENV_OVERRIDES {
        cmd.env_remove(var);
    }
    cmd
}

#[cfg(unix)]
#[test]
fn files_mode_writes_review_named_after_the_submission() {
    let root = TempDir::new().unwrap();
    let folder = submission(
        root.path(),
        "Ueding/01",
        &[("main.c", "int main(void) { return 0; }\n"), ("notes.bin", "x")],
    );
    let config = config_file(FAKE_TOOLS);

    review_cmd(&config)
        .current_dir(&folder)
        .arg("files")
        .arg("main.c")
        .arg("notes.bin")
        .assert()
        .success()
        .stdout(predicate::str::contains("Review-Ueding-01.pdf"));

    let artifact = fs::read_to_string(folder.join("Review-Ueding-01.pdf")).unwrap();
    assert!(artifact.contains(r"\documentclass"));
    assert!(artifact.contains(r"\section*{main.c}"));
    assert!(!artifact.contains("notes.bin"));
}

#[cfg(unix)]
#[test]
fn compile_failure_prints_document_source_and_engine_output() {
    let root = TempDir::new().unwrap();
    let folder = submission(root.path(), "Ueding/02", &[("main.c", "int main;\n")]);
    let config = config_file(FAILING_ENGINE);

    review_cmd(&config)
        .current_dir(&folder)
        .arg("files")
        .arg("main.c")
        .assert()
        .failure()
        .stderr(predicate::str::contains("compile"))
        .stderr(predicate::str::contains(r"\documentclass"))
        .stderr(predicate::str::contains("boom"));

    assert!(!folder.join("Review-Ueding-02.pdf").exists());
}

#[cfg(unix)]
#[test]
fn folders_mode_reviews_each_folder_and_reports_failures() {
    let root = TempDir::new().unwrap();
    let ueding = submission(root.path(), "Ueding/01", &[("main.c", "int a;\n")]);
    let schmidt = submission(
        root.path(),
        "Schmidt/01",
        &[("main.c", "int b;\n"), ("sheet.pdf", "ATTACHED-SHEET")],
    );
    let broken = submission(root.path(), "Meier/final", &[("main.c", "int c;\n")]);
    let config = config_file(FAKE_TOOLS);

    review_cmd(&config)
        .arg("folders")
        .arg("--jobs")
        .arg("2")
        .arg(&ueding)
        .arg(&schmidt)
        .arg(&broken)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 3 submissions failed"));

    assert!(root.path().join("Ueding/Review-Ueding-01.pdf").exists());
    let merged = fs::read_to_string(root.path().join("Schmidt/Review-Schmidt-01.pdf")).unwrap();
    assert!(merged.contains(r"\documentclass"));
    assert!(merged.ends_with("ATTACHED-SHEET"));
    assert!(!root.path().join("Meier").join("Review-Meier-final.pdf").exists());
}

#[cfg(unix)]
#[test]
fn folders_mode_ignores_review_left_by_files_mode() {
    let root = TempDir::new().unwrap();
    let folder = submission(root.path(), "Ueding/03", &[("main.c", "int a;\n")]);
    let config = config_file(FAKE_TOOLS);

    review_cmd(&config)
        .current_dir(&folder)
        .args(["files", "main.c"])
        .assert()
        .success();
    assert!(folder.join("Review-Ueding-03.pdf").exists());

    review_cmd(&config)
        .arg("folders")
        .arg(&folder)
        .assert()
        .success();

    let review = fs::read_to_string(root.path().join("Ueding/Review-Ueding-03.pdf")).unwrap();
    assert_eq!(review.matches(r"\documentclass").count(), 1);
}

#[test]
fn files_mode_requires_at_least_one_file() {
    let mut cmd = Command::cargo_bin("submission-review").expect("Binary exists");
    cmd.arg("files").assert().failure();
}

#[test]
fn rejects_unknown_ordering() {
    let mut cmd = Command::cargo_bin("submission-review").expect("Binary exists");
    cmd.args(["--ordering", "random", "files", "main.c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("random"));
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use submission_review::cli::{run, Cli, Commands};

    let folder = TempDir::new().unwrap();
    let cli = Cli {
        config: None,
        ordering: None,
        command: Commands::Files {
            folder: Some(folder.path().to_path_buf()),
            output_dir: Some(folder.path().to_path_buf()),
            files: vec!["missing.c".to_string()],
        },
    };

    let result = run(cli).await;
    assert!(result.is_err(), "a missing file cannot be reviewed");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
