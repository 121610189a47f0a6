#![no_main]

use libfuzzer_sys::fuzz_target;
use mailtrail_core::{LogWindow, MailLog, MtaFormat, SendAttempt, parse};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for format in [MtaFormat::Exim, MtaFormat::Postfix] {
        for raw in text.lines() {
            let _ = parse(raw, format);
        }

        let window = LogWindow::from_lines(text.lines());
        let log = MailLog::parse(&window, format);
        let attempt = SendAttempt::submitted("fuzz@example.com", Default::default());
        let _ = log.assess(&[attempt], &Default::default());
    }
});
