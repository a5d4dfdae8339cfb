use pow_ledger::cli::run_cli;
use pow_ledger::LedgerError;

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("❌ {:#}", err);

        let code = err
            .downcast_ref::<LedgerError>()
            .map_or(1, LedgerError::exit_code);
        std::process::exit(code);
    }
}
