// Supply-chain input data and its validated network form

use super::error::BuildError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

/// Position of a node in the three-tier chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Supplier,
    Roastery,
    Cafe,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Supplier => write!(f, "supplier"),
            Tier::Roastery => write!(f, "roastery"),
            Tier::Cafe => write!(f, "cafe"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Supplier {
    pub name: String,
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Roastery {
    pub name: String,
    /// Cost per unit of each product roasted here
    pub roasting_cost: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cafe {
    pub name: String,
    pub demand: BTreeMap<String, f64>,
}

/// Directed route with a unit shipping cost
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub from: String,
    pub to: String,
    pub unit_cost: f64,
}

/// Raw supply-chain description, as handed over by the data collaborator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplyChain {
    pub products: Vec<String>,
    pub suppliers: Vec<Supplier>,
    pub roasteries: Vec<Roastery>,
    pub cafes: Vec<Cafe>,
    pub supply_routes: Vec<Route>,
    pub delivery_routes: Vec<Route>,
}

impl SupplyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(mut self, name: impl Into<String>) -> Self {
        self.products.push(name.into());
        self
    }

    pub fn supplier(mut self, name: impl Into<String>, capacity: f64) -> Self {
        self.suppliers.push(Supplier {
            name: name.into(),
            capacity,
        });
        self
    }

    pub fn roastery(mut self, name: impl Into<String>, costs: &[(&str, f64)]) -> Self {
        self.roasteries.push(Roastery {
            name: name.into(),
            roasting_cost: costs.iter().map(|&(p, c)| (p.to_string(), c)).collect(),
        });
        self
    }

    pub fn cafe(mut self, name: impl Into<String>, demand: &[(&str, f64)]) -> Self {
        self.cafes.push(Cafe {
            name: name.into(),
            demand: demand.iter().map(|&(p, d)| (p.to_string(), d)).collect(),
        });
        self
    }

    pub fn supply_route(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        unit_cost: f64,
    ) -> Self {
        self.supply_routes.push(Route {
            from: from.into(),
            to: to.into(),
            unit_cost,
        });
        self
    }

    pub fn delivery_route(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        unit_cost: f64,
    ) -> Self {
        self.delivery_routes.push(Route {
            from: from.into(),
            to: to.into(),
            unit_cost,
        });
        self
    }

    /// Sum of all supplier capacities
    pub fn total_capacity(&self) -> f64 {
        self.suppliers.iter().map(|s| s.capacity).sum()
    }

    /// Sum of all cafe demands over every product
    pub fn total_demand(&self) -> f64 {
        self.cafes.iter().flat_map(|c| c.demand.values()).sum()
    }
}

/// Ordered pair of node names identifying a route
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeKey {
    pub source: String,
    pub destination: String,
}

impl EdgeKey {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.source, self.destination)
    }
}

/// Edge-keyed values in declaration order.
///
/// The key set is fixed when the map is built; every constraint family
/// enumerates exactly these keys instead of filtering a shared table.
#[derive(Debug, Clone)]
pub struct EdgeMap<V> {
    entries: Vec<(EdgeKey, V)>,
    index: HashMap<EdgeKey, usize>,
}

impl<V> EdgeMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a new key; returns the value back if the key is already present
    pub fn insert(&mut self, key: EdgeKey, value: V) -> Result<(), V> {
        if self.index.contains_key(&key) {
            return Err(value);
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    pub fn get(&self, source: &str, destination: &str) -> Option<&V> {
        let key = EdgeKey::new(source, destination);
        self.index.get(&key).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, key: &EdgeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &EdgeKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Entries whose source is `node`
    pub fn outbound<'a>(&'a self, node: &'a str) -> impl Iterator<Item = (&'a EdgeKey, &'a V)> {
        self.iter().filter(move |(k, _)| k.source == node)
    }

    /// Entries whose destination is `node`
    pub fn inbound<'a>(&'a self, node: &'a str) -> impl Iterator<Item = (&'a EdgeKey, &'a V)> {
        self.iter().filter(move |(k, _)| k.destination == node)
    }

    /// Same keys, new values
    pub fn map<W>(&self, mut f: impl FnMut(&EdgeKey, &V) -> W) -> EdgeMap<W> {
        EdgeMap {
            entries: self.entries.iter().map(|(k, v)| (k.clone(), f(k, v))).collect(),
            index: self.index.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for EdgeMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Supply chain whose node, product and route sets have been checked
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    products: Vec<String>,
    suppliers: Vec<(String, f64)>,
    roasteries: Vec<String>,
    cafes: Vec<String>,
    roasting_cost: HashMap<(String, String), f64>,
    demand: HashMap<(String, String), f64>,
    supply_routes: EdgeMap<f64>,
    delivery_routes: EdgeMap<f64>,
}

impl FlowNetwork {
    /// Check the raw data and index it by node, product and route
    pub fn validate(chain: &SupplyChain) -> Result<Self, BuildError> {
        let mut products: Vec<String> = Vec::with_capacity(chain.products.len());
        for product in &chain.products {
            if products.contains(product) {
                return Err(BuildError::DuplicateProduct(product.clone()));
            }
            products.push(product.clone());
        }

        let mut tiers: HashMap<&str, Tier> = HashMap::new();
        let names = chain
            .suppliers
            .iter()
            .map(|s| (s.name.as_str(), Tier::Supplier))
            .chain(chain.roasteries.iter().map(|r| (r.name.as_str(), Tier::Roastery)))
            .chain(chain.cafes.iter().map(|c| (c.name.as_str(), Tier::Cafe)));
        for (name, tier) in names {
            if tiers.insert(name, tier).is_some() {
                return Err(BuildError::DuplicateNode(name.to_string()));
            }
        }

        let mut suppliers = Vec::with_capacity(chain.suppliers.len());
        for supplier in &chain.suppliers {
            check_scalar(
                || format!("capacity of supplier '{}'", supplier.name),
                supplier.capacity,
            )?;
            suppliers.push((supplier.name.clone(), supplier.capacity));
        }

        let mut roasting_cost = HashMap::new();
        for roastery in &chain.roasteries {
            for (product, &cost) in &roastery.roasting_cost {
                if !products.contains(product) {
                    return Err(BuildError::UnknownProduct {
                        node: roastery.name.clone(),
                        product: product.clone(),
                    });
                }
                check_scalar(
                    || format!("roasting cost of '{}' at '{}'", product, roastery.name),
                    cost,
                )?;
                roasting_cost.insert((roastery.name.clone(), product.clone()), cost);
            }
        }

        let mut demand = HashMap::new();
        for cafe in &chain.cafes {
            for (product, &amount) in &cafe.demand {
                if !products.contains(product) {
                    return Err(BuildError::UnknownProduct {
                        node: cafe.name.clone(),
                        product: product.clone(),
                    });
                }
                check_scalar(
                    || format!("demand for '{}' at '{}'", product, cafe.name),
                    amount,
                )?;
                demand.insert((cafe.name.clone(), product.clone()), amount);
            }
            if let Some(product) = products.iter().find(|p| !cafe.demand.contains_key(*p)) {
                return Err(BuildError::MissingDemand {
                    cafe: cafe.name.clone(),
                    product: product.clone(),
                });
            }
        }

        let supply_routes = route_map(&chain.supply_routes, &tiers, Tier::Supplier, Tier::Roastery)?;
        let delivery_routes = route_map(&chain.delivery_routes, &tiers, Tier::Roastery, Tier::Cafe)?;

        let network = Self {
            products,
            suppliers,
            roasteries: chain.roasteries.iter().map(|r| r.name.clone()).collect(),
            cafes: chain.cafes.iter().map(|c| c.name.clone()).collect(),
            roasting_cost,
            demand,
            supply_routes,
            delivery_routes,
        };

        for roastery in &network.roasteries {
            if network.delivery_routes.outbound(roastery).next().is_none() {
                continue;
            }
            if let Some(product) = network
                .products
                .iter()
                .find(|p| network.roasting_cost(roastery, p).is_none())
            {
                return Err(BuildError::MissingRoastingCost {
                    roastery: roastery.clone(),
                    product: product.clone(),
                });
            }
            if network.supply_routes.inbound(roastery).next().is_none() {
                warn!(roastery = %roastery, "roastery ships to cafes but receives no supply");
            }
        }
        for cafe in &network.cafes {
            let wanted: f64 = network.products.iter().map(|p| network.demand(cafe, p)).sum();
            if wanted > 0.0 && network.delivery_routes.inbound(cafe).next().is_none() {
                warn!(cafe = %cafe, demand = wanted, "cafe has demand but no delivery route");
            }
        }

        Ok(network)
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// Suppliers with their capacities, in declaration order
    pub fn suppliers(&self) -> impl Iterator<Item = (&str, f64)> {
        self.suppliers.iter().map(|(s, c)| (s.as_str(), *c))
    }

    pub fn roasteries(&self) -> &[String] {
        &self.roasteries
    }

    pub fn cafes(&self) -> &[String] {
        &self.cafes
    }

    pub fn roasting_cost(&self, roastery: &str, product: &str) -> Option<f64> {
        self.roasting_cost
            .get(&(roastery.to_string(), product.to_string()))
            .copied()
    }

    /// Demand floor; every cafe/product pair has one after validation
    pub fn demand(&self, cafe: &str, product: &str) -> f64 {
        self.demand
            .get(&(cafe.to_string(), product.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Supplier to roastery routes with their unit costs
    pub fn supply_routes(&self) -> &EdgeMap<f64> {
        &self.supply_routes
    }

    /// Roastery to cafe routes with their unit costs
    pub fn delivery_routes(&self) -> &EdgeMap<f64> {
        &self.delivery_routes
    }
}

fn check_scalar(what: impl FnOnce() -> String, value: f64) -> Result<(), BuildError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BuildError::InvalidScalar {
            what: what(),
            value,
        })
    }
}

fn route_map(
    routes: &[Route],
    tiers: &HashMap<&str, Tier>,
    from_tier: Tier,
    to_tier: Tier,
) -> Result<EdgeMap<f64>, BuildError> {
    let mut map = EdgeMap::new();
    for route in routes {
        for node in [&route.from, &route.to] {
            if !tiers.contains_key(node.as_str()) {
                return Err(BuildError::UnknownNode {
                    from: route.from.clone(),
                    to: route.to.clone(),
                    node: node.clone(),
                });
            }
        }
        if tiers.get(route.from.as_str()) != Some(&from_tier)
            || tiers.get(route.to.as_str()) != Some(&to_tier)
        {
            return Err(BuildError::TierMismatch {
                from: route.from.clone(),
                to: route.to.clone(),
                expected_from: from_tier,
                expected_to: to_tier,
            });
        }
        check_scalar(
            || format!("unit cost of route {} -> {}", route.from, route.to),
            route.unit_cost,
        )?;
        map.insert(EdgeKey::new(&route.from, &route.to), route.unit_cost)
            .map_err(|_| BuildError::DuplicateRoute {
                from: route.from.clone(),
                to: route.to.clone(),
            })?;
    }
    Ok(map)
}
