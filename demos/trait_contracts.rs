//! Trait contracts example for lazy-singleton-registry.
//!
//! Demonstrates:
//! - Keying trait-object singletons by channel name (`LazyRegistry<&str, dyn Notifier>`)
//! - A type-keyed contract (`Arc<dyn Logger>`) resolved lazily by business logic
//! - First construction wins: later factories for the same key never run
//!
//! Run with: `cargo run --example trait_contracts`

use lazy_singleton_registry::{define_registry, LazyRegistry};
use std::sync::Arc;

// Create an isolated registry for this example
define_registry!(services);

// =============================================================================
// Contract Definitions (Traits)
// =============================================================================

trait Logger: Send + Sync {
    fn log(&self, message: &str);
    fn name(&self) -> &str;
}

trait Notifier: Send + Sync {
    fn notify(&self, recipient: &str, message: &str);
    fn service_type(&self) -> &str;
}

// =============================================================================
// Concrete Implementations
// =============================================================================

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("[CONSOLE] {}", message);
    }

    fn name(&self) -> &str {
        "ConsoleLogger"
    }
}

struct EmailNotifier {
    smtp_server: String,
}

impl Notifier for EmailNotifier {
    fn notify(&self, recipient: &str, message: &str) {
        println!(
            "[EMAIL via {}] To: {} - {}",
            self.smtp_server, recipient, message
        );
    }

    fn service_type(&self) -> &str {
        "Email"
    }
}

struct SmsNotifier {
    api_key: String,
}

impl Notifier for SmsNotifier {
    fn notify(&self, recipient: &str, message: &str) {
        println!(
            "[SMS via API:{}] To: {} - {}",
            &self.api_key[..8],
            recipient,
            message
        );
    }

    fn service_type(&self) -> &str {
        "SMS"
    }
}

// =============================================================================
// Application Code (Uses Contracts, Not Implementations)
// =============================================================================

fn logger() -> Arc<dyn Logger> {
    let logger = services::get_or_create(|| {
        println!("   (building ConsoleLogger)");
        Arc::new(ConsoleLogger) as Arc<dyn Logger>
    })
    .unwrap();
    Arc::clone(&*logger)
}

type Notifiers = LazyRegistry<&'static str, dyn Notifier>;

fn notifier(notifiers: &Notifiers, channel: &'static str) -> Arc<dyn Notifier> {
    notifiers
        .get_or_create_arc(&channel, || {
            println!("   (building {channel} notifier)");
            match channel {
                "sms" => Arc::new(SmsNotifier {
                    api_key: "sk_live_abc123xyz789".to_string(),
                }) as Arc<dyn Notifier>,
                _ => Arc::new(EmailNotifier {
                    smtp_server: "smtp.example.com".to_string(),
                }) as Arc<dyn Notifier>,
            }
        })
        .unwrap()
}

fn process_order(notifiers: &Notifiers, order_id: u32, channel: &'static str) {
    let logger = logger();
    logger.log(&format!("Processing order #{}", order_id));
    logger.log("Order confirmed!");

    let message = format!("Order #{} confirmed!", order_id);
    notifier(notifiers, channel).notify("customer@example.com", &message);
}

fn main() {
    println!("=== lazy-singleton-registry: Trait Contracts ===\n");

    let notifiers = Notifiers::new();

    println!("1. First order by email (builds logger and email notifier)...\n");
    process_order(&notifiers, 1001, "email");

    println!("\n2. Second order by email (everything cached)...\n");
    process_order(&notifiers, 1002, "email");

    println!("\n3. Third order by SMS (builds only the SMS notifier)...\n");
    process_order(&notifiers, 1003, "sms");

    println!("\n4. Verifying current implementations...");
    println!("   Logger: {}", logger().name());
    for channel in ["email", "sms"] {
        let n = notifiers.peek(&channel).unwrap();
        println!("   Notifier[{channel}]: {}", n.service_type());
    }

    println!("\n=== Example Complete ===");
    println!("Each contract was constructed exactly once, on first use.");
}
