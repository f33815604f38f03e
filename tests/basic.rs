use structopt::StructOpt;

use cptool_util::assert_matches;

#[test]
fn run_with_no_args() {
    let res = cptool::Opt::from_iter_safe(&["cptool"]);
    assert_matches!(res => Err(_));
}

#[test]
fn parse_every_command() {
    let commands: &[&[&str]] = &[
        &["cptool", "login"],
        &["cptool", "logout"],
        &["cptool", "me", "--output", "yaml"],
        &["cptool", "contests", "(gym)", "--all", "--omit-finished"],
        &["cptool", "submissions", "1234", "--handle", "tourist", "--pages", "2"],
        &["cptool", "submissions", "--live"],
        &["cptool", "submit", "1234 b", "main.cpp", "--lang", "GNU G++17 7.3.0"],
        &["cptool", "problems", "https://codeforces.com/contest/4"],
        &["cptool", "source", "1234", "70000000"],
        &["cptool", "countdown", "1234"],
        &["cptool", "register", "1234", "-y"],
    ];
    for args in commands {
        let res = cptool::Opt::from_iter_safe(*args);
        assert!(res.is_ok(), "could not parse {:?}", args);
    }
}

#[test]
fn reject_unknown_service() {
    let res = cptool::Opt::from_iter_safe(&["cptool", "me", "--service", "atcoder"]);
    assert_matches!(res => Err(_));
}
