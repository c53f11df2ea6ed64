use super::{load_settings_from, normalize_server_url, Settings};

use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn defaults_point_at_local_reading_service() {
    let settings = Settings::default();
    assert_eq!(
        settings.reading_url().expect("url").as_str(),
        "http://127.0.0.1:5000/get_reading"
    );
    assert_eq!(
        settings.card_url(5).expect("url").as_str(),
        "http://127.0.0.1:5000/get_card/5"
    );
}

#[test]
fn routes_join_under_server_path_prefix() {
    let settings = Settings {
        server_url: "https://tarot.example/api".into(),
        card_route: "/card/".into(),
        reading_route: "reading".into(),
        ..Settings::default()
    };
    assert_eq!(
        settings.card_url(12).expect("url").as_str(),
        "https://tarot.example/api/card/12"
    );
    assert_eq!(
        settings.reading_url().expect("url").as_str(),
        "https://tarot.example/api/reading"
    );
}

#[test]
fn bare_host_gets_http_scheme() {
    assert_eq!(normalize_server_url("localhost:5000"), "http://localhost:5000/");
    assert_eq!(
        normalize_server_url(" http://10.0.0.2:8080/ "),
        "http://10.0.0.2:8080/"
    );
}

#[test]
fn reads_flat_toml_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("tarot_client_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("create temp dir");
    let path = temp_root.join("tarot.toml");
    fs::write(
        &path,
        "card_route = \"/card\"\nreading_route = \"/reading\"\nshuffle = \"false\"\nshuffle_seed = \"99\"\nrequest_timeout_secs = \"5\"\n",
    )
    .expect("write config");

    let settings = load_settings_from(&path);
    assert_eq!(settings.card_route, "/card");
    assert_eq!(settings.reading_route, "/reading");
    assert!(!settings.shuffle);
    assert_eq!(settings.shuffle_seed, Some(99));
    assert_eq!(settings.request_timeout_secs, 5);

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn missing_file_keeps_defaults() {
    let settings = load_settings_from(std::path::Path::new("/nonexistent/tarot.toml"));
    assert_eq!(settings.card_route, Settings::default().card_route);
    assert_eq!(settings.reading_route, Settings::default().reading_route);
}

#[test]
fn native_toml_values_are_accepted() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("tarot_client_native_toml_{suffix}"));
    fs::create_dir_all(&temp_root).expect("create temp dir");
    let path = temp_root.join("tarot.toml");
    fs::write(
        &path,
        "server_url = \"http://reading.example:9000\"\nshuffle = false\nrequest_timeout_secs = 5\nshuffle_seed = 7\n",
    )
    .expect("write config");

    let settings = load_settings_from(&path);
    if env::var("TAROT_SERVER_URL").is_err() && env::var("APP__SERVER_URL").is_err() {
        assert_eq!(settings.server_url, "http://reading.example:9000");
    }
    assert!(!settings.shuffle);
    assert_eq!(settings.request_timeout_secs, 5);
    assert_eq!(settings.shuffle_seed, Some(7));

    fs::remove_dir_all(temp_root).expect("cleanup");
}
