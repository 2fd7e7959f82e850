#![no_main]

use libfuzzer_sys::fuzz_target;
use votebot::commands::CommandRequest;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let request = CommandRequest::parse(&text, "#fuzz", "fuzzer");

    assert!(!request.command.is_empty());
    assert!(!request.command.chars().any(char::is_whitespace));
    assert_eq!(request.channel(), "#fuzz");
    let _ = request.arg(0, "poll id");
});
