//! Accessors over the process environment.
//!
//! Each test owns distinct variables, so they can run in parallel.

use std::env;

use chatbot_config::config::env::{auth_key, host, port, HTTP_AUTH_KEY, HTTP_HOST, HTTP_PORT};

#[test]
fn test_port_from_env() {
    env::remove_var(HTTP_PORT);
    assert_eq!(port(), 7777);

    env::set_var(HTTP_PORT, "not-a-number");
    assert_eq!(port(), 7777);

    env::set_var(HTTP_PORT, "8081");
    assert_eq!(port(), 8081);
}

#[test]
fn test_host_from_env() {
    env::remove_var(HTTP_HOST);
    assert_eq!(host(), "127.0.0.1");

    env::set_var(HTTP_HOST, "0.0.0.0");
    assert_eq!(host(), "0.0.0.0");
}

// One test owns HTTP_AUTH_KEY so the cases below never interleave.
#[test]
fn test_auth_key_stable_within_process() {
    env::remove_var(HTTP_AUTH_KEY);
    let unset = auth_key();
    assert_eq!(unset.len(), 32);
    assert_eq!(env::var(HTTP_AUTH_KEY).unwrap(), unset);
    assert_eq!(auth_key(), unset);

    env::set_var(HTTP_AUTH_KEY, "");
    let empty = auth_key();
    assert!(!empty.is_empty());
    assert_ne!(empty, unset);
    assert_eq!(auth_key(), empty);

    env::set_var(HTTP_AUTH_KEY, "default");
    let placeholder = auth_key();
    assert_ne!(placeholder, "default");
    assert_eq!(env::var(HTTP_AUTH_KEY).unwrap(), placeholder);
    assert_eq!(auth_key(), placeholder);

    env::set_var(HTTP_AUTH_KEY, "default");
    let keys: Vec<String> = (0..8)
        .map(|_| std::thread::spawn(auth_key))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert!(keys.iter().all(|key| *key == keys[0]));
    assert_ne!(keys[0], "default");

    env::set_var(HTTP_AUTH_KEY, "explicit");
    assert_eq!(auth_key(), "explicit");
}

#[test]
fn test_tool_paths_optional() {
    use chatbot_config::config::env::{ffmpeg_path, ffplay_path, ffprobe_path};

    env::set_var("FFMPEG_PATH", "/usr/bin/ffmpeg");
    env::set_var("FFPROBE_PATH", "");
    env::remove_var("FFPLAY_PATH");

    assert_eq!(ffmpeg_path().as_deref(), Some("/usr/bin/ffmpeg"));
    assert_eq!(ffprobe_path(), None);
    assert_eq!(ffplay_path(), None);
}
