fn main() {
    if let Err(err) = string2tree::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
