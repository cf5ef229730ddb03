use finagent::smoke::{exit_code, run_checks, CheckStatus};

fn main() {
    finagent::init();

    println!("Testing Financial Agent Basic Functionality...");
    println!("{}", "=".repeat(50));

    let results = run_checks(|key| std::env::var(key).ok());
    for result in &results {
        let icon = match result.status {
            CheckStatus::Pass => "\u{2713}",
            CheckStatus::Fail => "\u{2717}",
        };
        println!("{icon} {}", result.detail);
    }

    let code = exit_code(&results);
    if code == 0 {
        println!();
        println!("Basic checks successful! Financial agent core is working.");
    }
    std::process::exit(code);
}
