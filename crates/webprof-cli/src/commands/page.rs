//! Profiler page commands
//!
//! Each command builds a request, hands it to the controller and prints the
//! response: the body for pages, `Location: <url>` for redirects.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::Path;
use webprof_web::{FileSession, ProfilerController, Request, Response, UploadedFile};

/// Print a response to stdout
pub fn print(response: &Response) -> Result<()> {
    if let Some(location) = response.location() {
        println!("Location: {location}");
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(response.body())?;
    stdout.flush()?;
    Ok(())
}

fn request_with<'s>(params: &[(&str, &str)]) -> Request<'s> {
    params
        .iter()
        .fold(Request::new(), |request, (key, value)| request.with_query(*key, *value))
}

pub fn panel(
    controller: &ProfilerController,
    token: &str,
    panel: Option<String>,
    page: Option<String>,
    xhr: bool,
) -> Result<()> {
    let mut request = Request::new().with_xhr(xhr);
    if let Some(panel) = panel {
        request = request.with_query("panel", panel);
    }
    if let Some(page) = page {
        request = request.with_query("page", page);
    }

    print(&controller.panel(&request, token)?)
}

pub fn export(controller: &ProfilerController, token: &str, output: Option<&Path>) -> Result<()> {
    let response = controller.export(token)?;

    match output {
        Some(path) => {
            std::fs::write(path, response.body())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported profile {token} to: {}", path.display());
            Ok(())
        }
        None => print(&response),
    }
}

pub fn import(controller: &ProfilerController, file: &Path) -> Result<()> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    // An unreadable file is reported the way a failed upload is
    let upload = match std::fs::read(file) {
        Ok(contents) => UploadedFile::new(name, contents),
        Err(e) => {
            tracing::warn!("Failed to read {}: {e}", file.display());
            UploadedFile::failed(name, e.to_string())
        }
    };

    let request = Request::new().with_file("file", upload);
    print(&controller.import(&request)?)
}

pub fn toolbar(
    controller: &ProfilerController,
    session_path: &Path,
    token: Option<&str>,
    position: Option<&str>,
) -> Result<()> {
    let mut session = FileSession::load(session_path)?;
    let response = {
        let mut request = Request::new().with_session(&mut session);
        controller.toolbar(&mut request, token, position)?
    };
    session.save()?;

    print(&response)
}

pub fn search_bar(controller: &ProfilerController, session_path: &Path) -> Result<()> {
    let mut session = FileSession::load(session_path)?;
    let response = {
        let request = Request::new().with_session(&mut session);
        controller.search_bar(&request)?
    };
    session.save()?;

    print(&response)
}

pub fn search(
    controller: &ProfilerController,
    session_path: &Path,
    params: &[(&str, &str)],
) -> Result<()> {
    let mut session = FileSession::load(session_path)?;
    let response = {
        let mut request = request_with(params).with_session(&mut session);
        controller.search(&mut request)?
    };
    session.save()?;

    print(&response)
}

pub fn results(
    controller: &ProfilerController,
    token: &str,
    params: &[(&str, &str)],
) -> Result<()> {
    print(&controller.search_results(&request_with(params), token)?)
}
