use std::process;

fn main() {
    if let Err(err) = event_sink::app::run() {
        eprintln!("fatal: {err:#}");
        process::exit(1);
    }
}
