//! 主資料模型（唯讀）
//!
//! 供應商、零件、BOM、客戶、設施、路線與產品目錄。載入後不再變動，
//! 保留檔案中的原始順序，另建 ID 索引供查詢。

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_reliability() -> f64 {
    0.9
}

fn default_price_multiplier() -> f64 {
    1.0
}

fn default_standard_cost() -> Decimal {
    Decimal::from(10)
}

/// 供應商
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    /// 可靠度分數 [0, 1]
    #[serde(default = "default_reliability")]
    pub reliability_score: f64,
    #[serde(default)]
    pub risk_factor: String,
    /// 價格乘數
    #[serde(default = "default_price_multiplier")]
    pub price_multiplier: f64,
}

impl Supplier {
    pub fn new(id: impl Into<String>, country: impl Into<String>, reliability_score: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            country: country.into(),
            reliability_score,
            risk_factor: String::new(),
            price_multiplier: 1.0,
        }
    }

    /// 建構器模式：設置價格乘數
    pub fn with_price_multiplier(mut self, price_multiplier: f64) -> Self {
        self.price_multiplier = price_multiplier;
        self
    }
}

/// 零件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub part_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// 標準成本
    #[serde(default = "default_standard_cost")]
    pub standard_cost: Decimal,
    #[serde(default)]
    pub unit_of_measure: String,
    /// 可供貨的供應商
    #[serde(default)]
    pub valid_supplier_ids: Vec<String>,
}

impl Part {
    pub fn new(part_id: impl Into<String>, standard_cost: Decimal) -> Self {
        Self {
            part_id: part_id.into(),
            name: String::new(),
            category: String::new(),
            standard_cost,
            unit_of_measure: "pcs".to_string(),
            valid_supplier_ids: Vec::new(),
        }
    }

    /// 建構器模式：設置可供貨供應商
    pub fn with_suppliers(mut self, supplier_ids: Vec<String>) -> Self {
        self.valid_supplier_ids = supplier_ids;
        self
    }
}

/// BOM 元件（已攤平：每單位成品所需零件數量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomComponent {
    pub component_id: String,
    pub qty: Decimal,
}

impl BomComponent {
    pub fn new(component_id: impl Into<String>, qty: Decimal) -> Self {
        Self {
            component_id: component_id.into(),
            qty,
        }
    }
}

/// 客戶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    /// 合約等級（"Tier 1" / "Tier 2"）
    #[serde(default)]
    pub contract_priority: String,
    /// 收貨設施
    #[serde(default)]
    pub destination_facility_id: Option<String>,
    #[serde(default)]
    pub delivery_location_code: Option<String>,
}

impl Customer {
    pub fn new(customer_id: impl Into<String>, contract_priority: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            company_name: String::new(),
            region: String::new(),
            country: String::new(),
            contract_priority: contract_priority.into(),
            destination_facility_id: None,
            delivery_location_code: None,
        }
    }

    /// 建構器模式：設置收貨設施
    pub fn with_destination(mut self, facility_id: impl Into<String>) -> Self {
        self.destination_facility_id = Some(facility_id.into());
        self
    }

    pub fn is_tier1(&self) -> bool {
        self.contract_priority == "Tier 1"
    }
}

/// 設施（工廠或配送中心）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub facility_id: String,
    #[serde(default)]
    pub facility_name: String,
    #[serde(default)]
    pub facility_type: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    pub location_code: String,
}

impl Facility {
    pub fn new(
        facility_id: impl Into<String>,
        facility_type: impl Into<String>,
        location_code: impl Into<String>,
    ) -> Self {
        Self {
            facility_id: facility_id.into(),
            facility_name: String::new(),
            facility_type: facility_type.into(),
            country: String::new(),
            region: String::new(),
            location_code: location_code.into(),
        }
    }

    pub fn is_plant(&self) -> bool {
        self.facility_type == "plant"
    }
}

/// 運輸路線
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub origin_facility_id: Option<String>,
    #[serde(default)]
    pub origin_location_code: Option<String>,
    #[serde(default)]
    pub destination_facility_id: Option<String>,
    #[serde(default)]
    pub destination_location_code: Option<String>,
    /// 進貨路線以國家標示目的地
    #[serde(default)]
    pub destination_country: Option<String>,
    #[serde(default)]
    pub typical_distance_miles: Decimal,
    pub typical_transit_days: u32,
    #[serde(default)]
    pub base_rate_per_mile: Decimal,
}

impl Route {
    /// 建立出貨路線
    pub fn outbound(
        route_id: impl Into<String>,
        origin_location_code: impl Into<String>,
        destination_location_code: impl Into<String>,
        typical_transit_days: u32,
    ) -> Self {
        Self {
            route_id: Some(route_id.into()),
            origin_facility_id: None,
            origin_location_code: Some(origin_location_code.into()),
            destination_facility_id: None,
            destination_location_code: Some(destination_location_code.into()),
            destination_country: None,
            typical_distance_miles: Decimal::ZERO,
            typical_transit_days,
            base_rate_per_mile: Decimal::ZERO,
        }
    }
}

/// 產品目錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub product_type: String,
    /// 售價；未提供時由 BOM 標準成本加成推算
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// 單位重量（磅）
    #[serde(default)]
    pub weight_lbs: Option<Decimal>,
}

impl Product {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            name: String::new(),
            product_type: String::new(),
            unit_price: None,
            weight_lbs: None,
        }
    }

    /// 建構器模式：設置售價
    pub fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    /// 建構器模式：設置單位重量
    pub fn with_weight(mut self, weight_lbs: Decimal) -> Self {
        self.weight_lbs = Some(weight_lbs);
        self
    }
}

/// 主資料索引
///
/// 所有清單保留載入順序；決策只依這些順序迭代，索引只用於查詢。
#[derive(Debug, Clone, Default)]
pub struct MasterData {
    suppliers: Vec<Supplier>,
    parts: Vec<Part>,
    boms: BTreeMap<String, Vec<BomComponent>>,
    customers: Vec<Customer>,
    facilities: Vec<Facility>,
    inbound_routes: Vec<Route>,
    outbound_routes: Vec<Route>,
    products: Vec<Product>,

    supplier_index: HashMap<String, usize>,
    part_index: HashMap<String, usize>,
    facility_index: HashMap<String, usize>,
    product_index: HashMap<String, usize>,
}

impl MasterData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置供應商
    pub fn with_suppliers(mut self, suppliers: Vec<Supplier>) -> Self {
        self.supplier_index = suppliers
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        self.suppliers = suppliers;
        self
    }

    /// 建構器模式：設置零件
    pub fn with_parts(mut self, parts: Vec<Part>) -> Self {
        self.part_index = parts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.part_id.clone(), i))
            .collect();
        self.parts = parts;
        self
    }

    /// 建構器模式：設置單一產品的 BOM
    pub fn with_bom(mut self, product_id: impl Into<String>, components: Vec<BomComponent>) -> Self {
        self.boms.insert(product_id.into(), components);
        self
    }

    /// 建構器模式：設置所有 BOM
    pub fn with_boms(mut self, boms: BTreeMap<String, Vec<BomComponent>>) -> Self {
        self.boms = boms;
        self
    }

    pub fn with_customers(mut self, customers: Vec<Customer>) -> Self {
        self.customers = customers;
        self
    }

    pub fn with_facilities(mut self, facilities: Vec<Facility>) -> Self {
        self.facility_index = facilities
            .iter()
            .enumerate()
            .map(|(i, f)| (f.facility_id.clone(), i))
            .collect();
        self.facilities = facilities;
        self
    }

    /// 建構器模式：設置路線（進貨、出貨）
    pub fn with_routes(mut self, inbound: Vec<Route>, outbound: Vec<Route>) -> Self {
        self.inbound_routes = inbound;
        self.outbound_routes = outbound;
        self
    }

    /// 建構器模式：設置產品目錄
    ///
    /// 目錄為空時，以 BOM 中的產品 ID（排序後）補齊。
    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self.reindex_products();
        self
    }

    /// 完成建構：產品目錄為空時由 BOM 推得
    pub fn finish(mut self) -> Self {
        if self.products.is_empty() {
            self.products = self.boms.keys().map(Product::new).collect();
        }
        self.reindex_products();
        self
    }

    fn reindex_products(&mut self) {
        self.product_index = self
            .products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.product_id.clone(), i))
            .collect();
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn inbound_routes(&self) -> &[Route] {
        &self.inbound_routes
    }

    pub fn outbound_routes(&self) -> &[Route] {
        &self.outbound_routes
    }

    pub fn boms(&self) -> &BTreeMap<String, Vec<BomComponent>> {
        &self.boms
    }

    pub fn supplier(&self, id: &str) -> Option<&Supplier> {
        self.supplier_index.get(id).map(|&i| &self.suppliers[i])
    }

    pub fn part(&self, id: &str) -> Option<&Part> {
        self.part_index.get(id).map(|&i| &self.parts[i])
    }

    pub fn is_part(&self, id: &str) -> bool {
        self.part_index.contains_key(id)
    }

    pub fn facility(&self, id: &str) -> Option<&Facility> {
        self.facility_index.get(id).map(|&i| &self.facilities[i])
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.product_index.get(id).map(|&i| &self.products[i])
    }

    pub fn is_product(&self, id: &str) -> bool {
        self.product_index.contains_key(id)
    }

    /// 產品的 BOM 元件（無 BOM 時為空）
    pub fn bom(&self, product_id: &str) -> &[BomComponent] {
        self.boms
            .get(product_id)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    /// 出貨工廠（第一個 plant 類型的設施）
    pub fn plant(&self) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.is_plant())
    }

    /// 查找出貨路線
    pub fn outbound_route(&self, origin_code: &str, destination_code: &str) -> Option<&Route> {
        self.outbound_routes.iter().find(|r| {
            r.origin_location_code.as_deref() == Some(origin_code)
                && r.destination_location_code.as_deref() == Some(destination_code)
        })
    }

    /// BOM 標準成本累計（每單位成品）
    pub fn standard_cost_rollup(&self, product_id: &str) -> Decimal {
        self.bom(product_id)
            .iter()
            .map(|c| {
                let cost = self
                    .part(&c.component_id)
                    .map(|p| p.standard_cost)
                    .unwrap_or_else(default_standard_cost);
                cost * c.qty
            })
            .sum()
    }

    /// 產品售價：目錄價優先，否則為標準成本累計乘上加成（四捨五入到分）
    pub fn unit_price(&self, product_id: &str, markup: Decimal) -> Decimal {
        match self.product(product_id).and_then(|p| p.unit_price) {
            Some(price) => price,
            None => (self.standard_cost_rollup(product_id) * markup).round_dp(2),
        }
    }
}
