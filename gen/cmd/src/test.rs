use std::path::PathBuf;

#[test]
fn test_help() {
    let mut app = super::app();
    let mut out = Vec::new();
    app.write_long_help(&mut out).unwrap();
    let help = String::from_utf8(out).unwrap();
    assert!(help.starts_with("cppfier "));
    for flag in [
        "--config <file>",
        "--source <dir>",
        "--output <dir>",
        "--namespace <ns>",
        "--prefix <prefix>",
        "--ignore <token>",
        "--check",
    ] {
        assert!(help.contains(flag), "missing {} in:\n{}", flag, help);
    }
}

#[test]
fn test_cli() {
    let app = super::app();
    app.debug_assert();
}

#[test]
fn test_args() {
    let matches = super::app()
        .try_get_matches_from([
            "cppfier",
            "SDL_video.h",
            "SDL_rect.h",
            "-o",
            "out",
            "-p",
            "SDL_",
            "--ignore",
            "SDL_DECLSPEC",
            "--ignore",
            "SDLCALL",
            "--check",
        ])
        .unwrap();
    let opt = super::from_matches(&matches);
    assert_eq!(
        opt.inputs,
        [PathBuf::from("SDL_video.h"), PathBuf::from("SDL_rect.h")],
    );
    assert_eq!(opt.output, Some(PathBuf::from("out")));
    assert_eq!(opt.prefixes, ["SDL_"]);
    assert_eq!(opt.ignore, ["SDL_DECLSPEC", "SDLCALL"]);
    assert_eq!(opt.config, None);
    assert!(opt.check);
}
