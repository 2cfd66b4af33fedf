fn main() {
    if let Err(err) = backlink_metrics::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
