mod clapui;
mod cmdui;

#[tokio::main]
async fn main() {
    let code = match cmdui::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            1
        }
    };
    log::logger().flush();
    std::process::exit(code);
}
