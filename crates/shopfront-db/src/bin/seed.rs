//! # Seed Data Generator
//!
//! Populates a fresh database with the storefront's starter content.
//!
//! ## Usage
//! ```bash
//! # Seed ./shopfront.db
//! cargo run -p shopfront-db --bin seed
//!
//! # Specify database path and admin password
//! cargo run -p shopfront-db --bin seed -- --db ./data/shopfront.db --admin-password s3cret
//! ```
//!
//! ## Seeded Content
//! - Categories: Antivirus, Internet Security, Total Protection, VPN
//! - An antivirus catalog (`p1`..), some featured and some "loved"
//! - `WELCOME10`: 10% off everything, no minimum
//! - `admin` account (argon2-hashed password)
//! - About / Refund Policy / Privacy Policy pages
//! - Three testimonials
//!
//! Seeding is skipped when the database already has products.

use std::env;

use anyhow::Context;
use shopfront_core::coupon::{validate_coupon, CouponDraft};
use shopfront_core::validation::slugify;
use shopfront_core::{MenuLocation, UserRole};
use shopfront_db::{Database, DbConfig, NewUser, PageDraft, ProductDraft, TestimonialDraft};
use tracing_subscriber::EnvFilter;

const CATEGORIES: &[&str] = &["Antivirus", "Internet Security", "Total Protection", "VPN"];

/// (name, category, brand, old price, price, rating, featured, loved)
const PRODUCTS: &[(&str, &str, &str, i64, i64, f64, bool, bool)] = &[
    ("Watchdog Antivirus - 1PC", "Antivirus", "Watchdog", 3999, 999, 4.5, true, false),
    ("McAfee Antivirus - 3PC", "Antivirus", "McAfee", 5999, 2999, 4.0, true, false),
    ("Kaspersky Internet Security", "Internet Security", "Kaspersky", 7999, 4999, 4.8, true, true),
    ("Bitdefender Internet Security", "Internet Security", "Bitdefender", 8999, 5999, 4.7, true, true),
    ("McAfee Total Protection", "Total Protection", "McAfee", 12999, 9999, 4.2, false, false),
    ("McAfee Antivirus Plus 1 Device / 1 Year", "Antivirus", "McAfee", 5999, 3445, 3.9, false, false),
    ("McAfee Antivirus Plus 10-Devices / 5-Year", "Antivirus", "McAfee", 7999, 5999, 4.1, false, false),
    ("McAfee Internet Security 1 Device / 1 Year", "Internet Security", "McAfee", 5999, 3999, 3.5, false, false),
    ("McAfee Total Protection 5-Devices", "Total Protection", "McAfee", 11999, 9999, 4.6, false, true),
    ("Norton 360 Standard", "Antivirus", "Norton", 10000, 9000, 4.9, false, true),
    ("Norton 360 Deluxe", "Total Protection", "Norton", 12000, 10000, 4.5, false, false),
    ("Norton 360 Premium", "Total Protection", "Norton", 15000, 12500, 4.9, false, false),
    ("Norton Antivirus Plus", "Antivirus", "Norton", 6000, 3400, 4.3, false, false),
    ("Norton Secure VPN", "VPN", "Norton", 5000, 3000, 4.4, false, false),
];

/// (title, menu, order, content)
const PAGES: &[(&str, MenuLocation, i64, &str)] = &[
    (
        "About Us",
        MenuLocation::Both,
        1,
        "<p>We sell genuine security software licences with instant email delivery.</p>",
    ),
    (
        "Refund Policy",
        MenuLocation::Footer,
        2,
        "<p>Unused licence keys can be refunded within 30 days of purchase.</p>",
    ),
    (
        "Privacy Policy",
        MenuLocation::Footer,
        3,
        "<p>We only keep the details needed to deliver your order.</p>",
    ),
];

const TESTIMONIALS: &[(&str, &str, f64)] = &[
    ("Priya S.", "Key arrived in under a minute and activated first time.", 5.0),
    ("Daniel R.", "Half the price of the vendor's own store. Will buy again.", 4.5),
    ("Mei L.", "Support sorted out my licence transfer the same day.", 4.0),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./shopfront.db");
    let mut admin_password = String::from("admin123");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" | "-p" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>                Database file path (default: ./shopfront.db)");
                println!("  -p, --admin-password <PW>      Password for the admin account (default: admin123)");
                println!("  -h, --help                     Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shopfront Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for name in CATEGORIES {
        db.categories().insert(name).await?;
    }
    println!("✓ {} categories", CATEGORIES.len());

    for (name, category, brand, old_price, price, rating, featured, loved) in PRODUCTS {
        let draft = ProductDraft {
            name: name.to_string(),
            category: category.to_string(),
            brand: brand.to_string(),
            platform: "Windows, macOS, Android, iOS".to_string(),
            delivery: "Instant Email Delivery".to_string(),
            old_price_cents: *old_price,
            price_cents: *price,
            image: format!("/image/{}.png", slugify(name)),
            short_desc: format!(
                "{brand} protection for your devices. Activate instantly. No shipping required."
            ),
            long_desc: vec![format!(
                "{name} keeps your devices safe from viruses, ransomware and phishing."
            )],
            rating: *rating,
            is_featured: *featured,
            is_loved: *loved,
            ..ProductDraft::default()
        };
        draft.validate().with_context(|| format!("product {name}"))?;
        db.products().insert(&draft).await?;
    }
    println!("✓ {} products", PRODUCTS.len());

    let welcome = validate_coupon(CouponDraft {
        code: "WELCOME10".to_string(),
        discount_type: "percentage".to_string(),
        discount_value: 10.0,
        ..CouponDraft::default()
    })?;
    db.coupons().insert(&welcome).await?;
    println!("✓ Coupon {}", welcome.code);

    db.users()
        .insert(&NewUser {
            username: "admin".to_string(),
            email: "admin@shopfront.local".to_string(),
            password: admin_password,
            role: UserRole::Admin,
            full_name: "Store Admin".to_string(),
        })
        .await?;
    println!("✓ Admin user \"admin\"");

    for (title, menu_location, order, content) in PAGES {
        db.pages()
            .insert(&PageDraft {
                title: title.to_string(),
                content: content.to_string(),
                menu_location: *menu_location,
                sort_order: *order,
            })
            .await?;
    }
    println!("✓ {} pages", PAGES.len());

    for (user_name, quote, rating) in TESTIMONIALS {
        db.testimonials()
            .insert(&TestimonialDraft {
                quote: quote.to_string(),
                rating: *rating,
                user_name: user_name.to_string(),
                user_image: String::new(),
            })
            .await?;
    }
    println!("✓ {} testimonials", TESTIMONIALS.len());

    println!();
    let hits = db.products().search("norton").await?;
    println!("  Search 'norton': {} results", hits.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
