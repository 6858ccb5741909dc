use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use coursenav::formats::{HeaderType, ModuleId};
use coursenav::source::{HttpModuleSource, ModuleSource as _};
use coursenav::viewer::{CourseViewer, ViewerOptions};
use predicates::prelude::*;
use url::Url;

static MODULES_JSON: &str = r#"[
  {"id": 10, "header_type": "Chapter", "title": "Intro"},
  {"id": 11, "header_type": "Lesson", "title": "Welcome"},
  {"id": 12, "header_type": "Chapter", "title": "Deep dive"},
  {"id": 13, "header_type": "Section", "title": "Internals"},
  {"id": 14, "header_type": "Lesson", "title": "Memory"}
]"#;

fn spawn_course_server() -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let addr = server.server_addr();
    let base_url = format!("http://{addr}/api/");

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let url = request.url().to_string();
            let (status, body) = match url.as_str() {
                "/api/courses/rust-101/modules" => (200, MODULES_JSON.to_owned()),
                "/api/modules/10" => (
                    200,
                    r#"{"title":"Intro","header_type":"chapter","description":"start here"}"#
                        .to_owned(),
                ),
                "/api/modules/12" => (
                    200,
                    r#"{"title":"Deep dive","header_type":"chapter","video_url":"https://videos.example/12"}"#
                        .to_owned(),
                ),
                _ => (404, "not found".to_owned()),
            };

            let mut response = tiny_http::Response::from_string(body).with_status_code(status);
            if status == 200 {
                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    &b"application/json"[..],
                )
                .expect("build header");
                response = response.with_header(header);
            }

            let _ = request.respond(response);
        }
    });

    (base_url, shutdown_tx, handle)
}

#[tokio::test]
async fn http_source_fetches_modules_and_details() -> anyhow::Result<()> {
    let (base_url, shutdown_tx, server_handle) = spawn_course_server();
    let source = HttpModuleSource::new(Url::parse(&base_url)?, Duration::from_secs(5))?;

    let records = source.fetch_course_modules("rust-101").await?;
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].id, ModuleId::new("10"));
    assert_eq!(records[3].header_type, HeaderType::Section);

    let detail = source.fetch_module_detail(&ModuleId::new("10")).await?;
    assert_eq!(detail.description.as_deref(), Some("start here"));

    let err = source
        .fetch_module_detail(&ModuleId::new("99"))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("404"), "{err:#}");

    shutdown_tx.send(())?;
    server_handle.join().expect("join server thread");
    Ok(())
}

#[tokio::test]
async fn viewer_loads_course_over_http() -> anyhow::Result<()> {
    let (base_url, shutdown_tx, server_handle) = spawn_course_server();
    let source = HttpModuleSource::new(Url::parse(&base_url)?, Duration::from_secs(5))?;

    let mut viewer =
        CourseViewer::load(std::sync::Arc::new(source), "rust-101", ViewerOptions::default())
            .await?;
    viewer.drain_details().await;

    let state = viewer.snapshot();
    assert_eq!(state.selected_module_id, Some(ModuleId::new("10")));
    assert_eq!(state.chapters.len(), 2);
    assert_eq!(state.detail.map(|d| d.title), Some("Intro".to_owned()));

    viewer.click_chapter(&ModuleId::new("12"));
    viewer.drain_details().await;
    let state = viewer.snapshot();
    assert!(state.chapters[1].is_expanded);
    assert_eq!(
        state.detail.and_then(|d| d.video_url),
        Some("https://videos.example/12".to_owned())
    );

    shutdown_tx.send(())?;
    server_handle.join().expect("join server thread");
    Ok(())
}

#[test]
fn fetch_command_prints_outline() {
    let (base_url, shutdown_tx, server_handle) = spawn_course_server();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("coursenav");
    cmd.args([
        "fetch",
        "--base-url",
        &base_url,
        "--course",
        "rust-101",
        "--expand",
        "12",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("[+] 1. Intro"))
    .stdout(predicate::str::contains("[-] 2. Deep dive"))
    .stdout(predicate::str::contains("1. Memory [#2]"));

    shutdown_tx.send(()).expect("stop server");
    server_handle.join().expect("join server thread");
}

#[test]
fn fetch_command_reports_http_errors() {
    let (base_url, shutdown_tx, server_handle) = spawn_course_server();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("coursenav");
    cmd.args(["fetch", "--base-url", &base_url, "--course", "unknown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("404"));

    shutdown_tx.send(()).expect("stop server");
    server_handle.join().expect("join server thread");
}
