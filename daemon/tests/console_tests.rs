use powerpilot_daemon::console::{
    wait_readable, Console, FdLineReader, TerminalConsole, TimedInput,
};
use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

#[test]
fn test_wait_readable_times_out_on_idle_input() {
    let (_writer, reader) = UnixStream::pair().unwrap();
    let start = Instant::now();
    let ready = wait_readable(reader.as_raw_fd(), Duration::from_millis(100)).unwrap();
    assert!(!ready);
    assert!(start.elapsed() >= Duration::from_millis(90));
}

#[test]
fn test_wait_readable_sees_data() {
    let (mut writer, reader) = UnixStream::pair().unwrap();
    writer.write_all(b"y").unwrap();
    assert!(wait_readable(reader.as_raw_fd(), Duration::from_secs(5)).unwrap());
}

#[test]
fn test_wait_readable_sees_closed_writer() {
    let (writer, reader) = UnixStream::pair().unwrap();
    drop(writer);
    assert!(wait_readable(reader.as_raw_fd(), Duration::from_secs(5)).unwrap());
}

#[test]
fn test_line_reader_splits_lines_and_reports_eof() {
    let (mut writer, reader) = UnixStream::pair().unwrap();
    writer.write_all(b"yes\r\nfoo bar\ntail").unwrap();
    drop(writer);

    let mut lines = FdLineReader::new(reader.as_raw_fd());
    assert_eq!(lines.read_line().unwrap().as_deref(), Some("yes"));
    assert_eq!(lines.read_line().unwrap().as_deref(), Some("foo bar"));
    assert_eq!(lines.read_line().unwrap().as_deref(), Some("tail"));
    assert_eq!(lines.read_line().unwrap(), None);
}

#[test]
fn test_buffered_line_counts_as_ready_and_is_discarded() {
    let (mut writer, reader) = UnixStream::pair().unwrap();
    writer.write_all(b"yes\nstale\n").unwrap();

    let mut lines = FdLineReader::new(reader.as_raw_fd());
    assert_eq!(lines.read_line().unwrap().as_deref(), Some("yes"));
    // "stale" now sits in the reader's buffer, not in the socket.
    assert!(!wait_readable(reader.as_raw_fd(), Duration::ZERO).unwrap());
    assert!(lines.wait_input(Duration::ZERO).unwrap());

    lines.discard();
    assert!(!lines.wait_input(Duration::from_millis(20)).unwrap());
}

#[tokio::test]
async fn test_terminal_console_times_out() {
    let (_writer, reader) = UnixStream::pair().unwrap();
    let mut console = TerminalConsole::with_reader(FdLineReader::new(reader.as_raw_fd()));

    let start = Instant::now();
    let input = console
        .read_token_within("kill? ", Duration::from_millis(100))
        .await
        .unwrap();
    assert_eq!(input, TimedInput::TimedOut);
    assert!(start.elapsed() >= Duration::from_millis(90));
}

#[tokio::test]
async fn test_terminal_console_reads_first_token_in_time() {
    let (mut writer, reader) = UnixStream::pair().unwrap();
    writer.write_all(b"yes please\n\n  foo  bar\n").unwrap();
    let mut console = TerminalConsole::with_reader(FdLineReader::new(reader.as_raw_fd()));

    let input = console
        .read_token_within("kill? ", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(input, TimedInput::Ready(Some("yes".to_string())));
    assert_eq!(
        console.read_token("name: ").await.unwrap().as_deref(),
        Some("foo")
    );
}

#[tokio::test]
async fn test_terminal_console_closed_input() {
    let (writer, reader) = UnixStream::pair().unwrap();
    drop(writer);
    let mut console = TerminalConsole::with_reader(FdLineReader::new(reader.as_raw_fd()));

    let input = console
        .read_token_within("kill? ", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(input, TimedInput::Ready(None));
    assert_eq!(console.read_token("name: ").await.unwrap(), None);
}

#[tokio::test]
async fn test_terminal_console_discard_drops_leftovers() {
    let (mut writer, reader) = UnixStream::pair().unwrap();
    writer.write_all(b"no\nleftover\n").unwrap();
    let mut console = TerminalConsole::with_reader(FdLineReader::new(reader.as_raw_fd()));

    let input = console
        .read_token_within("kill? ", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(input, TimedInput::Ready(Some("no".to_string())));

    console.discard_pending();
    let input = console
        .read_token_within("kill? ", Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(input, TimedInput::TimedOut);
}
