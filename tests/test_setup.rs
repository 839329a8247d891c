//! Exercises the log-directory resolution fallback chain and sink selection
//! (spec §4.2), without actually forking a child process.

use srt_logger::config::LoggerConfig;

fn clear_log_dir_env() {
    std::env::remove_var("SRT_LOG_DIR");
    std::env::remove_var("STEAM_CLIENT_LOG_FOLDER");
}

#[test]
fn explicit_log_dir_wins_over_everything() {
    clear_log_dir_env();
    let dir = temp_dir::TempDir::new().unwrap();
    let config = LoggerConfig::builder()
        .identifier("myprog")
        .log_dir(dir.path().to_path_buf())
        .build();

    let outcome = srt_logger::setup(&config).unwrap();
    assert_eq!(outcome.state.log_dir, dir.path());
    assert_eq!(outcome.state.filename, "myprog.txt");
}

#[test]
fn missing_log_dir_is_a_fatal_error() {
    clear_log_dir_env();
    std::env::remove_var("HOME");
    let config = LoggerConfig::builder()
        .identifier("myprog")
        .log_dir("/definitely/does/not/exist")
        .build();

    let err = srt_logger::setup(&config).unwrap_err();
    assert!(matches!(err, srt_logger::LoggerError::NoLogDirectory(_)));
}

#[test]
fn filename_with_slash_is_rejected() {
    clear_log_dir_env();
    let dir = temp_dir::TempDir::new().unwrap();
    let config = LoggerConfig::builder()
        .identifier("myprog")
        .filename("foo/bar")
        .log_dir(dir.path().to_path_buf())
        .build();

    let err = srt_logger::setup(&config).unwrap_err();
    assert!(matches!(err, srt_logger::LoggerError::BadArgument(_)));
}

#[test]
fn filename_starting_with_dot_is_rejected() {
    clear_log_dir_env();
    let dir = temp_dir::TempDir::new().unwrap();
    let config = LoggerConfig::builder()
        .identifier("myprog")
        .filename(".hidden")
        .log_dir(dir.path().to_path_buf())
        .build();

    let err = srt_logger::setup(&config).unwrap_err();
    assert!(matches!(err, srt_logger::LoggerError::BadArgument(_)));
}

#[test]
fn env_var_rotation_size_overrides_config_default() {
    clear_log_dir_env();
    let dir = temp_dir::TempDir::new().unwrap();
    std::env::set_var("SRT_LOG_ROTATION", "0");
    let config = LoggerConfig::builder()
        .identifier("myprog")
        .log_dir(dir.path().to_path_buf())
        .max_bytes(12345)
        .build();

    let outcome = srt_logger::setup(&config).unwrap();
    assert_eq!(outcome.state.max_bytes, 0);
    std::env::remove_var("SRT_LOG_ROTATION");
}
