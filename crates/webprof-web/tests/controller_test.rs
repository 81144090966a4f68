//! Controller tests
//!
//! Every page is driven through `ProfilerController` with in-memory storage
//! and sessions.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use webprof_core::{Profile, Profiler, SqliteStorage};
use webprof_web::routing::PROFILER_ROUTE;
use webprof_web::{
    ControllerError, FlashMode, HtmlRenderer, MemorySession, ProfilerConfig, ProfilerController,
    Request, RouteTable, Session, TemplateManager, UploadedFile,
};

fn create_profiler() -> Profiler {
    let storage = SqliteStorage::in_memory().expect("Failed to create storage");
    Profiler::with_default_collectors(Box::new(storage))
}

fn create_controller() -> ProfilerController {
    ProfilerController::from_config(create_profiler(), &ProfilerConfig::default())
}

fn sample_profile(token: &str, method: &str, url: &str, minutes: i64) -> Profile {
    let mut profile = Profile::new(token);
    profile.ip = "127.0.0.1".to_string();
    profile.method = method.to_string();
    profile.url = url.to_string();
    profile.status_code = Some(200);
    profile.time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
    profile.add_collector("request", json!({ "method": method, "path": url }));
    profile.add_collector("time", json!({ "duration_ms": 12.5 }));
    profile
}

fn seed(controller: &ProfilerController, profile: &Profile) {
    assert!(controller.profiler().save_profile(profile).unwrap());
}

#[test]
fn test_panel_renders_collector_data() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "GET", "/blog", 0));

    let request = Request::new().with_query("panel", "time");
    let response = controller.panel(&request, "abc123").unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text();
    assert!(body.contains("data-panel=\"time\""));
    assert!(body.contains("<dt>duration_ms</dt><dd>12.5</dd>"));
    assert!(body.contains("<li class=\"selected\">time</li>"));
    assert!(body.contains("<li>request</li>"));
}

#[test]
fn test_panel_defaults_to_request_home() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "GET", "/blog", 0));

    let response = controller.panel(&Request::new(), "abc123").unwrap();
    assert!(response
        .text()
        .contains("data-panel=\"request\" data-page=\"home\""));
}

#[test]
fn test_panel_xhr_renders_fragment() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "GET", "/blog", 0));

    let request = Request::new().with_xhr(true);
    let response = controller.panel(&request, "abc123").unwrap();
    assert!(response.text().starts_with("<section"));
}

#[test]
fn test_panel_unknown_token_renders_info() {
    let controller = create_controller();

    let response = controller.panel(&Request::new(), "missing").unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text();
    assert!(body.contains("data-about=\"no_token\""));
    assert!(body.contains("Token &quot;missing&quot; was not found"));
}

#[test]
fn test_panel_missing_collector_is_not_found() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "GET", "/blog", 0));

    let request = Request::new().with_query("panel", "memory");
    let err = controller.panel(&request, "abc123").unwrap_err();

    assert_eq!(err.status(), 404);
    assert_eq!(
        err.to_string(),
        "Panel \"memory\" is not available for token \"abc123\"."
    );
}

#[test]
fn test_panel_unregistered_collector_is_not_found() {
    let controller = create_controller();
    let mut profile = sample_profile("abc123", "GET", "/blog", 0);
    profile.add_collector("events", json!({ "listeners": 3 }));
    seed(&controller, &profile);

    // Present in the profile, but no collector of that name is registered
    let request = Request::new().with_query("panel", "events");
    let err = controller.panel(&request, "abc123").unwrap_err();
    assert!(matches!(err, ControllerError::NotFound(_)));
    assert!(err.to_string().contains("is not registered in profiler"));
}

#[test]
fn test_export_returns_attachment() {
    let controller = create_controller();
    let profile = sample_profile("abc123", "GET", "/blog", 0);
    seed(&controller, &profile);

    let response = controller.export("abc123").unwrap();
    let stored = controller.profiler().load_profile("abc123").unwrap().unwrap();
    let expected = controller.profiler().export(&stored).unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(
        response.header("Content-Disposition"),
        Some("attachment; filename=abc123.txt")
    );
    assert_eq!(response.body(), expected.as_bytes());
}

#[test]
fn test_export_unknown_token_is_not_found() {
    let controller = create_controller();

    let err = controller.export("missing").unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(err.to_string(), "Token \"missing\" does not exist.");
}

#[test]
fn test_purge_redirects_to_info() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "GET", "/blog", 0));

    let response = controller.purge().unwrap();
    assert_eq!(response.status(), 302);
    assert_eq!(response.location(), Some("/_profiler/info/purge"));
    assert!(controller.profiler().load_profile("abc123").unwrap().is_none());
}

#[test]
fn test_import_round_trip() {
    let source = create_controller();
    seed(&source, &sample_profile("abc123", "GET", "/blog", 0));
    let exported = source.export("abc123").unwrap();

    let target = create_controller();
    let request = Request::new().with_file("file", UploadedFile::new("abc123.txt", exported.body()));
    let response = target.import(&request).unwrap();

    assert_eq!(response.location(), Some("/_profiler/abc123"));
    let imported = target.profiler().load_profile("abc123").unwrap().unwrap();
    assert_eq!(imported.url, "/blog");
}

#[test]
fn test_import_existing_token() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "GET", "/blog", 0));
    let exported = controller.export("abc123").unwrap();

    let request = Request::new().with_file("file", UploadedFile::new("abc123.txt", exported.body()));
    let response = controller.import(&request).unwrap();
    assert_eq!(response.location(), Some("/_profiler/info/already_exists"));
}

#[test]
fn test_import_bad_uploads() {
    let controller = create_controller();
    let upload_error = Some("/_profiler/info/upload_error");

    let missing = controller.import(&Request::new()).unwrap();
    assert_eq!(missing.location(), upload_error);

    let failed = Request::new().with_file("file", UploadedFile::failed("big.txt", "too large"));
    assert_eq!(controller.import(&failed).unwrap().location(), upload_error);

    let garbage = Request::new().with_file("file", UploadedFile::new("x.txt", "not an export"));
    assert_eq!(controller.import(&garbage).unwrap().location(), upload_error);

    let binary = Request::new().with_file("file", UploadedFile::new("x.bin", vec![0xff, 0xfe]));
    assert_eq!(controller.import(&binary).unwrap().location(), upload_error);
}

#[test]
fn test_info_pages() {
    let controller = create_controller();

    let purge = controller.info("purge").unwrap();
    assert!(purge.text().contains("purged successfully"));

    let unknown = controller.info("whatever").unwrap();
    assert!(unknown.text().contains("data-about=\"whatever\""));
}

#[test]
fn test_toolbar_without_token_is_empty() {
    let controller = create_controller();
    let mut request = Request::new();

    let response = controller.toolbar(&mut request, None, None).unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.body().is_empty());
}

#[test]
fn test_toolbar_unknown_token_is_empty() {
    let controller = create_controller();
    let mut request = Request::new();

    let response = controller.toolbar(&mut request, Some("missing"), None).unwrap();
    assert!(response.body().is_empty());
}

#[test]
fn test_toolbar_links_to_profiler() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "POST", "/login", 0));
    let mut request = Request::new();

    let response = controller.toolbar(&mut request, Some("abc123"), None).unwrap();
    let body = response.text();
    assert!(body.contains("webprof-toolbar-bottom"));
    assert!(body.contains("POST /login"));
    assert!(body.contains("href=\"/_profiler/abc123?panel=request\""));
    assert!(body.contains("href=\"/_profiler/abc123\""));

    let response = controller
        .toolbar(&mut request, Some("abc123"), Some("top"))
        .unwrap();
    assert!(response.text().contains("webprof-toolbar-top"));
}

#[test]
fn test_toolbar_without_profiler_route_has_no_link() {
    let controller = ProfilerController::new(
        create_profiler(),
        Box::new(HtmlRenderer::new()),
        Box::new(RouteTable::profiler("/_profiler").without(PROFILER_ROUTE)),
        TemplateManager::default(),
        "bottom",
    );
    seed(&controller, &sample_profile("abc123", "GET", "/", 0));
    let mut request = Request::new();

    let response = controller.toolbar(&mut request, Some("abc123"), None).unwrap();
    let body = response.text();
    assert!(body.contains("data-token=\"abc123\""));
    assert!(!body.contains("href="));
}

#[test]
fn test_toolbar_rearms_auto_expire_flashes() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "GET", "/", 0));

    let mut session = MemorySession::with_flash_mode(FlashMode::AutoExpire);
    session.flash_bag_mut().add("notice", "Saved");
    // The page that set the flash redirects; the next page shows it
    session.flash_bag_mut().advance();
    assert_eq!(session.flash_bag().peek_all()["notice"], vec!["Saved"]);

    {
        let mut request = Request::new().with_session(&mut session);
        controller.toolbar(&mut request, Some("abc123"), None).unwrap();
    }

    // Without the re-arm this would clear the message
    session.flash_bag_mut().advance();
    assert_eq!(session.flash_bag().peek_all()["notice"], vec!["Saved"]);
}

#[test]
fn test_toolbar_leaves_direct_flashes_alone() {
    let controller = create_controller();
    let mut session = MemorySession::new();
    session.flash_bag_mut().add("notice", "Saved");

    {
        let mut request = Request::new().with_session(&mut session);
        controller.toolbar(&mut request, None, None).unwrap();
    }

    assert_eq!(session.flash_bag_mut().all()["notice"], vec!["Saved"]);
    assert!(session.flash_bag().peek_all().is_empty());
}

#[test]
fn test_search_bar_empty_session() {
    let controller = create_controller();
    let mut session = MemorySession::new();
    let request = Request::new().with_session(&mut session);

    let body = controller.search_bar(&request).unwrap().text().into_owned();
    assert!(body.contains("name=\"ip\" value=\"\""));
    assert!(body.contains("name=\"token\" value=\"\""));
}

#[test]
fn test_search_bar_without_session() {
    let controller = create_controller();

    let body = controller.search_bar(&Request::new()).unwrap().text().into_owned();
    assert!(body.contains("name=\"limit\" value=\"\""));
}

#[test]
fn test_search_remembers_sanitized_filter() {
    let controller = create_controller();
    let mut profile = sample_profile("ip1234", "GET", "/", 0);
    profile.ip = "1.2.3.4".to_string();
    seed(&controller, &profile);
    seed(&controller, &sample_profile("local1", "GET", "/", 5));
    let mut session = MemorySession::new();

    let response = {
        let mut request = Request::from_query_string("ip=1.2.3.4%3B+DROP&method=GET&limit=5")
            .with_session(&mut session);
        controller.search(&mut request).unwrap()
    };

    assert_eq!(
        response.location(),
        Some("/_profiler/ip1234/search/results?ip=1.2.3.4&method=GET&limit=5")
    );
    assert_eq!(session.get("_profiler_search_ip"), Some("1.2.3.4"));
    assert_eq!(session.get("_profiler_search_method"), Some("GET"));
    assert_eq!(session.get("_profiler_search_limit"), Some("5"));
    assert_eq!(session.get("_profiler_search_url"), None);

    let request = Request::new().with_session(&mut session);
    let body = controller.search_bar(&request).unwrap().text().into_owned();
    assert!(body.contains("name=\"ip\" value=\"1.2.3.4\""));
    assert!(body.contains("name=\"method\" value=\"GET\""));
}

#[test]
fn test_search_without_matches() {
    let controller = create_controller();
    let mut request = Request::new();

    let response = controller.search(&mut request).unwrap();
    assert_eq!(response.location(), Some("/_profiler/empty/search/results"));
}

#[test]
fn test_search_redirects_to_most_recent_match() {
    let controller = create_controller();
    seed(&controller, &sample_profile("old111", "GET", "/blog", 0));
    seed(&controller, &sample_profile("new222", "GET", "/blog/post", 5));
    seed(&controller, &sample_profile("pst333", "POST", "/blog", 10));

    let mut request = Request::from_query_string("method=GET&url=/blog");
    let response = controller.search(&mut request).unwrap();
    assert_eq!(
        response.location(),
        Some("/_profiler/new222/search/results?method=GET&url=%2Fblog")
    );
}

#[test]
fn test_search_with_token_jumps_to_profile() {
    let controller = create_controller();
    let mut request = Request::from_query_string("token=abc123&ip=10.0.0.1");

    let response = controller.search(&mut request).unwrap();
    assert_eq!(response.location(), Some("/_profiler/abc123"));
}

#[test]
fn test_search_results_lists_matches() {
    let controller = create_controller();
    seed(&controller, &sample_profile("old111", "GET", "/blog", 0));
    seed(&controller, &sample_profile("new222", "GET", "/shop", 5));

    let request = Request::from_query_string("url=/blog");
    let body = controller
        .search_results(&request, "old111")
        .unwrap()
        .text()
        .into_owned();
    assert!(body.contains("1 results found"));
    assert!(body.contains("<td>old111</td>"));
    assert!(!body.contains("new222"));
}

#[test]
fn test_search_results_unknown_token() {
    let controller = create_controller();

    let body = controller
        .search_results(&Request::new(), "empty")
        .unwrap()
        .text()
        .into_owned();
    assert!(body.contains("The query returned no result."));
}

#[test]
fn test_runtime_info() {
    let controller = create_controller();

    let body = controller.runtime_info().unwrap().text().into_owned();
    assert!(body.contains("Operating system"));
    assert!(body.contains(std::env::consts::OS));
}

#[test]
fn test_every_page_disables_profiler() {
    let controller = create_controller();
    seed(&controller, &sample_profile("abc123", "GET", "/", 0));
    let profiler = controller.profiler();

    let check = |name: &str| {
        assert!(!profiler.is_enabled(), "{name} left the profiler enabled");
        profiler.enable();
    };

    controller.panel(&Request::new(), "abc123").unwrap();
    check("panel");
    controller.export("abc123").unwrap();
    check("export");
    controller.info("purge").unwrap();
    check("info");
    controller.toolbar(&mut Request::new(), Some("abc123"), None).unwrap();
    check("toolbar");
    controller.toolbar(&mut Request::new(), None, None).unwrap();
    check("toolbar without token");
    controller.toolbar(&mut Request::new(), Some("missing"), None).unwrap();
    check("toolbar with unknown token");
    controller.search_bar(&Request::new()).unwrap();
    check("search_bar");
    controller.search_results(&Request::new(), "abc123").unwrap();
    check("search_results");
    controller.search(&mut Request::new()).unwrap();
    check("search");
    controller.runtime_info().unwrap();
    check("runtime_info");
    controller.import(&Request::new()).unwrap();
    check("import");
    controller.purge().unwrap();
    check("purge");
}
