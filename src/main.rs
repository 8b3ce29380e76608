fn main() {
    if let Err(err) = clanker_frame_lib::run() {
        log::error!("clanker-frame failed: {err:#}");
        std::process::exit(1);
    }
}
