//! # Seed Data Generator
//!
//! Populates the database with a demo property for development.
//!
//! ## Usage
//! ```bash
//! # 3 floors of 10 rooms (default)
//! cargo run -p stayhub-db --bin seed
//!
//! # Custom size
//! cargo run -p stayhub-db --bin seed -- --floors 5
//!
//! # Specify database path and staff password
//! cargo run -p stayhub-db --bin seed -- --db ./data/stayhub.db --password s3cret-pass
//! ```
//!
//! ## Generated Property
//! - Room types: Standard, Deluxe, Suite
//! - Rooms `{floor}{01..10}`: units 01-06 Standard, 07-09 Deluxe, 10 Suite
//! - Staff: admin, manager, frontdesk, accounts (one per role)

use std::env;

use stayhub_core::{Money, Role, RoomStatus};
use stayhub_db::{Database, DbConfig};

/// (name, nightly rate in minor units, max occupancy)
const ROOM_TYPES: &[(&str, i64, i64)] = &[
    ("Standard", 80_000, 2),
    ("Deluxe", 120_000, 3),
    ("Suite", 250_000, 4),
];

const ROOMS_PER_FLOOR: i64 = 10;

/// (username, full name, role)
const STAFF: &[(&str, &str, Role)] = &[
    ("admin", "Property Admin", Role::Admin),
    ("manager", "Duty Manager", Role::Manager),
    ("frontdesk", "Front Desk", Role::Receptionist),
    ("accounts", "Accounts", Role::Accountant),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut floors: i64 = 3;
    let mut db_path = String::from("./stayhub_dev.db");
    let mut password = String::from("stayhub-dev");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--floors" | "-f" => {
                if i + 1 < args.len() {
                    floors = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("StayHub Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --floors <N>       Number of floors (default: 3)");
                println!("  -d, --db <PATH>        Database file path (default: ./stayhub_dev.db)");
                println!("  -p, --password <PASS>  Password for every seeded staff account");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 StayHub Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Floors:   {}", floors);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing rooms
    let existing = db.rooms().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} rooms", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating room types...");
    let mut types = Vec::with_capacity(ROOM_TYPES.len());
    for (name, rate, occupancy) in ROOM_TYPES {
        let room_type = db
            .rooms()
            .create_type(name, Money::from_minor(*rate), *occupancy)
            .await?;
        println!("  {} at {} per night", room_type.name, room_type.base_price);
        types.push(room_type);
    }

    println!();
    println!("Creating rooms...");
    let start = std::time::Instant::now();
    let mut generated = 0;
    for floor in 1..=floors {
        for unit in 1..=ROOMS_PER_FLOOR {
            let type_idx = match unit {
                1..=6 => 0,
                7..=9 => 1,
                _ => 2,
            };
            let unit_number = format!("{}{:02}", floor, unit);
            if let Err(e) = db
                .rooms()
                .create_room(&types[type_idx].id, &unit_number, floor, RoomStatus::Available)
                .await
            {
                eprintln!("Failed to insert room {}: {}", unit_number, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ Created {} rooms in {:?}", generated, start.elapsed());

    println!();
    println!("Creating staff accounts...");
    for (username, full_name, role) in STAFF {
        match db.staff().create(username, full_name, *role, &password).await {
            Ok(staff) => println!("  {} ({})", staff.username, staff.role),
            Err(e) => eprintln!("Failed to create {}: {}", username, e),
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
