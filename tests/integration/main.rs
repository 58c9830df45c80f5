//! Integration tests for setup-sdl
//!
//! Only subcommands that work offline are exercised here.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_sdl() -> Command {
        let mut cmd = cargo_bin_cmd!("setup-sdl");
        cmd.env_remove("GITHUB_ACTIONS")
            .env_remove("SETUP_SDL_CONFIG")
            .env_remove("INPUT_VERSION");
        cmd
    }

    #[test]
    fn help_displays() {
        setup_sdl()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("provision a pinned SDL build"));
    }

    #[test]
    fn version_displays() {
        setup_sdl()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("setup-sdl"));
    }

    #[test]
    fn resolve_exact_release() {
        setup_sdl()
            .args(["resolve", "3.2.0"])
            .assert()
            .success()
            .stdout("release-3.2.0\n");
    }

    #[test]
    fn resolve_head_branches() {
        setup_sdl()
            .args(["resolve", "2-head"])
            .assert()
            .success()
            .stdout("SDL2\n");
        setup_sdl()
            .args(["resolve", "3-head"])
            .assert()
            .success()
            .stdout("main\n");
    }

    #[test]
    fn resolve_unsupported_head_fails() {
        setup_sdl()
            .args(["resolve", "4-head"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported major version"));
    }

    #[test]
    fn resolve_latest_respects_prerelease_flag() {
        setup_sdl()
            .args(["resolve", "3", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"reference\": \"release-3.2.16\""))
            .stdout(predicate::str::contains("\"requirement\": \"3-latest\""));
    }

    #[test]
    fn resolve_literal_passes_through() {
        setup_sdl()
            .args(["resolve", "feature/gpu-api"])
            .assert()
            .success()
            .stdout("feature/gpu-api\n");
    }

    #[test]
    fn resolve_rejects_option_like_literal() {
        setup_sdl()
            .args(["resolve", "--", "--upload-pack=x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid version requirement"));
    }

    #[test]
    fn releases_plain_lists_tags() {
        setup_sdl()
            .args(["releases", "--major", "2", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2.30.12\trelease-2.30.12"))
            .stdout(predicate::str::contains("prerelease-").not());
    }

    #[test]
    fn detect_reads_installed_header() {
        let prefix = TempDir::new().unwrap();
        let include = prefix.path().join("include/SDL2");
        fs::create_dir_all(&include).unwrap();
        fs::write(
            include.join("SDL_version.h"),
            "#define SDL_MAJOR_VERSION   2\n#define SDL_MINOR_VERSION   30\n#define SDL_PATCHLEVEL      8\n",
        )
        .unwrap();

        setup_sdl()
            .arg("detect")
            .arg(prefix.path())
            .assert()
            .success()
            .stdout("2.30.8\n");
    }

    #[test]
    fn detect_empty_prefix_fails() {
        let prefix = TempDir::new().unwrap();
        setup_sdl()
            .arg("detect")
            .arg(prefix.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Could not detect SDL version"));
    }

    #[test]
    fn config_path() {
        setup_sdl()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_then_show() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        setup_sdl()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();
        assert!(path.exists());

        setup_sdl()
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[source]"))
            .stdout(predicate::str::contains("libsdl-org/SDL.git"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache\n").unwrap();

        setup_sdl()
            .arg("--config")
            .arg(&path)
            .args(["releases"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn install_rejects_bad_build_type_before_network() {
        let dir = TempDir::new().unwrap();
        setup_sdl()
            .arg("--config")
            .arg(dir.path().join("missing.toml"))
            .args(["install", "--sdl-version", "3.2.0", "--build-type", "Fast"])
            .arg("--root")
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid build-type"));
    }
}
