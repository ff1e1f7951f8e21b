fn main() {
    if let Err(e) = termdesk_lib::run() {
        eprintln!("termdesk: {}", e);
        std::process::exit(1);
    }
}
