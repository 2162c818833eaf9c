//! 사용 가능한 전략 목록.

use trader_strategy::registry;

pub fn print_strategies() {
    for (name, description) in registry::describe() {
        println!("{name:<12} {description}");
    }
}
