#![allow(dead_code)]

use coffeeflow::network::FlowPlan;
use coffeeflow::{FlowModel, SupplyChain};

/// The three-supplier, two-roastery, three-cafe example
pub fn coffee() -> SupplyChain {
    SupplyChain::new()
        .product("light")
        .product("dark")
        .supplier("supplier1", 150.0)
        .supplier("supplier2", 50.0)
        .supplier("supplier3", 100.0)
        .roastery("roastery1", &[("light", 3.0), ("dark", 5.0)])
        .roastery("roastery2", &[("light", 5.0), ("dark", 6.0)])
        .cafe("cafe1", &[("light", 20.0), ("dark", 20.0)])
        .cafe("cafe2", &[("light", 30.0), ("dark", 20.0)])
        .cafe("cafe3", &[("light", 40.0), ("dark", 100.0)])
        .supply_route("supplier1", "roastery1", 5.0)
        .supply_route("supplier1", "roastery2", 4.0)
        .supply_route("supplier2", "roastery1", 6.0)
        .supply_route("supplier2", "roastery2", 3.0)
        .supply_route("supplier3", "roastery1", 2.0)
        .supply_route("supplier3", "roastery2", 7.0)
        .delivery_route("roastery1", "cafe1", 5.0)
        .delivery_route("roastery1", "cafe2", 3.0)
        .delivery_route("roastery1", "cafe3", 6.0)
        .delivery_route("roastery2", "cafe1", 4.0)
        .delivery_route("roastery2", "cafe2", 5.0)
        .delivery_route("roastery2", "cafe3", 2.0)
}

/// Two of each tier, fully connected, two products; scalars in declaration order
#[derive(Debug, Clone)]
pub struct SmallInstance {
    pub capacities: Vec<u32>,
    pub supply_costs: Vec<u32>,
    pub roasting_costs: Vec<u32>,
    pub delivery_costs: Vec<u32>,
    pub demands: Vec<u32>,
}

pub const PRODUCTS: [&str; 2] = ["light", "dark"];

impl SmallInstance {
    pub fn chain(&self) -> SupplyChain {
        let mut chain = SupplyChain::new().product(PRODUCTS[0]).product(PRODUCTS[1]);
        for s in 0..2 {
            chain = chain.supplier(format!("s{}", s), self.capacities[s] as f64);
        }
        for r in 0..2 {
            let costs: Vec<(&str, f64)> = PRODUCTS
                .iter()
                .enumerate()
                .map(|(p, &name)| (name, self.roasting_costs[r * 2 + p] as f64))
                .collect();
            chain = chain.roastery(format!("r{}", r), &costs);
        }
        for c in 0..2 {
            let demand: Vec<(&str, f64)> = PRODUCTS
                .iter()
                .enumerate()
                .map(|(p, &name)| (name, self.demands[c * 2 + p] as f64))
                .collect();
            chain = chain.cafe(format!("c{}", c), &demand);
        }
        for s in 0..2 {
            for r in 0..2 {
                chain = chain.supply_route(
                    format!("s{}", s),
                    format!("r{}", r),
                    self.supply_costs[s * 2 + r] as f64,
                );
            }
        }
        for r in 0..2 {
            for c in 0..2 {
                chain = chain.delivery_route(
                    format!("r{}", r),
                    format!("c{}", c),
                    self.delivery_costs[r * 2 + c] as f64,
                );
            }
        }
        chain
    }
}

/// Panics unless the plan respects every capacity, balance and demand row
pub fn assert_plan_satisfies(chain: &SupplyChain, flow: &FlowModel, plan: &FlowPlan) {
    let network = flow.network();

    for supplier in &chain.suppliers {
        let out = plan.supplier_outflow(&supplier.name);
        assert!(out >= 0);
        assert!(
            out as f64 <= supplier.capacity,
            "{} ships {} over capacity {}",
            supplier.name,
            out,
            supplier.capacity
        );
    }

    for roastery in network.roasteries() {
        let inbound: i64 = plan
            .shipments
            .iter()
            .filter(|s| &s.roastery == roastery)
            .map(|s| s.quantity)
            .sum();
        let outbound: i64 = plan
            .deliveries
            .iter()
            .filter(|d| &d.roastery == roastery)
            .map(|d| d.quantity)
            .sum();
        assert_eq!(inbound, outbound, "balance at {}", roastery);
    }

    for cafe in &chain.cafes {
        for (product, &demand) in &cafe.demand {
            let inflow = plan.cafe_inflow(&cafe.name, product);
            assert!(
                inflow as f64 >= demand,
                "{} receives {} {} below demand {}",
                cafe.name,
                inflow,
                product,
                demand
            );
        }
    }

    assert!(plan.shipments.iter().all(|s| s.quantity >= 0));
    assert!(plan.deliveries.iter().all(|d| d.quantity >= 0));
}

/// Objective recomputed from the flows and the raw cost tables
pub fn recompute_cost(chain: &SupplyChain, plan: &FlowPlan) -> f64 {
    let supply: f64 = chain
        .supply_routes
        .iter()
        .map(|r| r.unit_cost * plan.shipment(&r.from, &r.to).unwrap_or(0) as f64)
        .sum();
    let delivery: f64 = chain
        .delivery_routes
        .iter()
        .flat_map(|r| {
            chain.products.iter().map(move |p| {
                r.unit_cost * plan.delivery(&r.from, &r.to, p).unwrap_or(0) as f64
            })
        })
        .sum();
    let roasting: f64 = chain
        .roasteries
        .iter()
        .flat_map(|r| {
            r.roasting_cost
                .iter()
                .map(move |(p, c)| c * plan.roasted(&r.name, p).unwrap_or(0) as f64)
        })
        .sum();
    supply + delivery + roasting
}
