#![cfg(not(tarpaulin_include))]

use clap::Parser;
use optistock::backend::{Backend, MockBackend, StockUpdate};
use optistock::config::Config;
use optistock::downloader::{low_stock_csv, low_stock_file_name};
use optistock::inventory::{low_stock, valid_inventory, DashboardStats};
use optistock::loader::load_products;
use optistock::sheet_api::SheetClient;
use optistock::store::{Capture, InventoryStore};
use optistock::{Product, StockType};
use chrono::{Local, NaiveDate};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

fn print_products(items: &[Product]) {
    println!("{:<16} {:<32} {:>8} {:>8}", "Barcode", "Name", "Stock", "Min");
    for p in items {
        let flag = if p.is_low_stock() { " !" } else { "" };
        println!("{:<16} {:<32} {:>8} {:>8}{}", p.barcode, p.name, p.stock, p.min_stock, flag);
    }
}

fn parse_adjustment(args: &str) -> Option<(String, i64)> {
    let mut parts = args.split_whitespace();
    let barcode = parts.next()?.to_string();
    let amount = parts.next()?.parse().ok()?;
    Some((barcode, amount))
}

/// Terminal client for the inventory service
///
/// Same settings as the web server; `--mock` works without a network.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = Config::parse();

    let backend: Arc<dyn Backend> = if config.mock {
        match &config.mock_data {
            Some(path) => Arc::new(MockBackend::new(load_products(path)?)),
            None => Arc::new(MockBackend::demo()),
        }
    } else {
        Arc::new(SheetClient::new(&config.api_url))
    };
    let snapshot = (!config.mock).then(|| config.snapshot_path());
    if snapshot.is_some() {
        std::fs::create_dir_all(&config.data_dir)?;
    }
    let store = InventoryStore::new(backend, snapshot);

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        let (name, args) = command.split_once(' ').unwrap_or((command, ""));
        let args = args.trim();

        status = match name {
            "" => String::from("invalid command"),
            "help" => {
                println!("Commands:");
                println!("  q: Quit");
                println!("  inv: List the inventory (refreshes from the sheet)");
                println!("  dash: Dashboard figures");
                println!("  low: List low-stock items");
                println!("  find <barcode|name>: Look up a product");
                println!("  scan <code>: Resolve a scanned code");
                println!("  in <barcode> <amount>: Receive stock");
                println!("  out <barcode> <amount>: Issue stock");
                println!("  hist [YYYY-MM-DD]: Show history (optionally from a date)");
                println!("  report [note]: Save a report to the sheet");
                println!("  csv: Export low-stock items to CSV");
                String::from("ok")
            }
            "q" => break,
            "inv" => match store.refresh().await {
                Ok(list) => {
                    print_products(&valid_inventory(&list));
                    String::from("ok")
                }
                Err(e) => e.to_string(),
            },
            "dash" => match store.products().await {
                Ok(list) => {
                    let history = store.backend().history(None).await.unwrap_or_default();
                    let stats = DashboardStats::compute(&list, &history, Local::now().date_naive());
                    println!("Total products:     {}", stats.total_items);
                    println!("Low stock alerts:   {}", stats.low_stock);
                    println!("Transactions today: {}", stats.today_tx);
                    println!("Total stock value:  {:.2}", stats.total_value);
                    String::from("ok")
                }
                Err(e) => e.to_string(),
            },
            "low" => match store.products().await {
                Ok(list) => {
                    print_products(&low_stock(&valid_inventory(&list)));
                    String::from("ok")
                }
                Err(e) => e.to_string(),
            },
            "find" => match store.resolve(args).await {
                Ok(Some(p)) => {
                    print_products(&[p]);
                    String::from("ok")
                }
                Ok(None) => String::from("not found"),
                Err(e) => e.to_string(),
            },
            "scan" => match store.capture(args).await {
                Ok(Capture::Found(p)) => {
                    print_products(&[p]);
                    String::from("ok")
                }
                Ok(Capture::NotFound(code)) => format!("not found: {}", code),
                Err(e) => e.to_string(),
            },
            "in" | "out" => match parse_adjustment(args) {
                Some((barcode, amount)) => {
                    let kind = if name == "in" { StockType::In } else { StockType::Out };
                    let update = StockUpdate {
                        barcode,
                        amount,
                        kind,
                        user_id: config.user_id.clone(),
                        image_url: None,
                    };
                    match store.adjust_stock(update).await {
                        Ok(result) => match result.new_stock {
                            Some(stock) => format!("ok, stock {}", stock),
                            None => String::from("ok"),
                        },
                        Err(e) => e.to_string(),
                    }
                }
                None => String::from("usage: in|out <barcode> <amount>"),
            },
            "hist" => {
                let start = NaiveDate::parse_from_str(args, "%Y-%m-%d").ok();
                match store.backend().history(start).await {
                    Ok(rows) => {
                        for h in rows {
                            println!("{:<26} {:<16} {:<4} {:>6} {}", h.timestamp, h.barcode, h.kind, h.amount, h.user_id);
                        }
                        String::from("ok")
                    }
                    Err(e) => e.to_string(),
                }
            }
            "report" => {
                let note = if args.is_empty() { "Report from CLI" } else { args };
                match store.backend().save_report(note).await {
                    Ok(()) => String::from("ok"),
                    Err(e) => e.to_string(),
                }
            }
            "csv" => match store.products().await {
                Ok(list) => {
                    let items = low_stock(&valid_inventory(&list));
                    let file = low_stock_file_name(Local::now().date_naive());
                    match std::fs::write(&file, low_stock_csv(&items)) {
                        Ok(()) => format!("wrote {}", file),
                        Err(e) => e.to_string(),
                    }
                }
                Err(e) => e.to_string(),
            },
            _ => String::from("invalid command"),
        };
    }

    Ok(())
}
