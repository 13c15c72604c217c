mod app;
mod config;
mod fusion;
mod mpris;
mod poller;
mod relay;
mod render;
mod runtime;
mod status;
mod ui;
mod worker;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = match runtime::Options::parse(std::env::args().skip(1)) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("segue: {msg}\n{}", runtime::USAGE);
            std::process::exit(2);
        }
    };

    if options.help {
        println!("{}", runtime::USAGE);
        return Ok(());
    }

    runtime::run(options)
}
