//! 主資料與配置載入
//!
//! 目錄內的檔案：
//! - `suppliers.json`、`parts.json`、`bom.json`、`customers.json`（必要）
//! - `facilities.json`、`routes.json`、`products.json`（選用）

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use scsim_core::{
    BomComponent, Customer, Facility, MasterData, Part, Product, Result, Route, SimConfig,
    SimError, Supplier,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const SUPPLIERS_FILE: &str = "suppliers.json";
pub const PARTS_FILE: &str = "parts.json";
pub const BOM_FILE: &str = "bom.json";
pub const CUSTOMERS_FILE: &str = "customers.json";
pub const FACILITIES_FILE: &str = "facilities.json";
pub const ROUTES_FILE: &str = "routes.json";
pub const PRODUCTS_FILE: &str = "products.json";

#[derive(Debug, Deserialize)]
struct BomGroup {
    #[serde(default)]
    components: Vec<BomComponent>,
}

#[derive(Debug, Deserialize)]
struct ProductBom {
    #[serde(default)]
    bom: Vec<BomGroup>,
}

/// `bom.json`：多產品格式，或只描述單一產品的舊格式
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BomFile {
    MultiProduct {
        products: BTreeMap<String, ProductBom>,
    },
    Legacy {
        product_id: String,
        #[serde(default)]
        bom: Vec<BomGroup>,
    },
}

impl BomFile {
    /// 攤平成 產品 → 元件清單
    fn into_boms(self) -> BTreeMap<String, Vec<BomComponent>> {
        let flatten = |groups: Vec<BomGroup>| -> Vec<BomComponent> {
            groups.into_iter().flat_map(|g| g.components).collect()
        };

        match self {
            BomFile::MultiProduct { products } => products
                .into_iter()
                .map(|(id, product)| (id, flatten(product.bom)))
                .collect(),
            BomFile::Legacy { product_id, bom } => {
                let mut boms = BTreeMap::new();
                boms.insert(product_id, flatten(bom));
                boms
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RoutesFile {
    #[serde(default)]
    inbound: Vec<Route>,
    #[serde(default)]
    outbound: Vec<Route>,
}

/// 主資料載入器
pub struct MasterDataLoader {
    data_dir: PathBuf,
}

impl MasterDataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 載入並建立主資料索引
    pub fn load(&self) -> Result<MasterData> {
        let suppliers: Vec<Supplier> = read_json(&self.data_dir.join(SUPPLIERS_FILE))?;
        let parts: Vec<Part> = read_json(&self.data_dir.join(PARTS_FILE))?;
        let bom: BomFile = read_json(&self.data_dir.join(BOM_FILE))?;
        let customers: Vec<Customer> = read_json(&self.data_dir.join(CUSTOMERS_FILE))?;

        let facilities: Vec<Facility> =
            read_optional_json(&self.data_dir.join(FACILITIES_FILE))?.unwrap_or_default();
        let routes: RoutesFile =
            read_optional_json(&self.data_dir.join(ROUTES_FILE))?.unwrap_or_default();
        let products: Vec<Product> =
            read_optional_json(&self.data_dir.join(PRODUCTS_FILE))?.unwrap_or_default();

        let master = MasterData::new()
            .with_suppliers(suppliers)
            .with_parts(parts)
            .with_boms(bom.into_boms())
            .with_customers(customers)
            .with_facilities(facilities)
            .with_routes(routes.inbound, routes.outbound)
            .with_products(products)
            .finish();

        tracing::info!(
            "主資料載入完成 ({})：供應商 {}，零件 {}，產品 {}，客戶 {}，設施 {}",
            self.data_dir.display(),
            master.suppliers().len(),
            master.parts().len(),
            master.products().len(),
            master.customers().len(),
            master.facilities().len()
        );

        Ok(master)
    }
}

/// 讀取 JSON 配置檔（缺少的欄位使用預設值）並驗證
pub fn load_config(path: &Path) -> Result<SimConfig> {
    let raw = fs::read_to_string(path)
        .map_err(|e| SimError::data_load(path.display().to_string(), e.to_string()))?;
    SimConfig::from_json_str(&raw)
}

/// 讀取必要的 JSON 檔
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .map_err(|e| SimError::data_load(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&raw)
        .map_err(|e| SimError::data_load(path.display().to_string(), e.to_string()))
}

/// 讀取選用的 JSON 檔；檔案不存在時回傳 `None`
pub(crate) fn read_optional_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        tracing::debug!("選用檔案不存在，略過: {}", path.display());
        return Ok(None);
    }
    read_json(path).map(Some)
}
