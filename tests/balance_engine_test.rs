// ==========================================
// 余额结算引擎集成测试
// ==========================================
// 测试范围:
// 1. 运费折算: 价目命中 → base + 运费
// 2. 防重复: 外部持久化口径已含运费 → 原样返回
// 3. 待定线路: 承运商缺失/兜底/未定价
// 4. 价目变动口径配置化
// ==========================================


#[path = "helpers/test_data_builder.rs"]
mod test_data_builder;

use std::sync::{Arc, Mutex};

use stamp_oms::api::OrderApi;
use stamp_oms::config::{config_keys, ConfigManager};

use test_data_builder::{OrderBuilder, StampBuilder};

struct TestEnv {
    _temp_file: tempfile::NamedTempFile,
    repos: stamp_oms::engine::repositories::OrderRepositories,
    config: Arc<ConfigManager>,
    order_api: OrderApi,
}

fn setup() -> TestEnv {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let conn = test_helpers::open_test_connection(&db_path).expect("打开数据库失败");
    let conn = Arc::new(Mutex::new(conn));
    let repos = test_helpers::build_repositories(conn.clone());
    let config = test_helpers::build_config(conn);

    TestEnv {
        _temp_file: temp_file,
        order_api: OrderApi::new(repos.clone(), config.clone()),
        config,
        repos,
    }
}

/// 两条目订单: 1000-200 与 500-0,承运商 Andreani/Sucursal
fn seed_priced_order(env: &TestEnv) -> String {
    let order = OrderBuilder::new("C001")
        .carrier("Andreani", "Sucursal")
        .build();
    env.repos.order_repo.insert(&order).expect("插入订单失败");

    for (value, deposit) in [(1000.0, 200.0), (500.0, 0.0)] {
        let mut stamp = StampBuilder::new("pending").money(value, deposit).build();
        stamp.order_id = order.order_id.clone();
        env.repos.stamp_repo.insert(&stamp).expect("插入条目失败");
    }

    env.repos
        .shipping_rate_repo
        .upsert("Andreani", "Sucursal", 150.0)
        .expect("插入价目失败");

    order.order_id
}

#[tokio::test]
async fn test_first_computation_adds_shipping_cost() {
    let env = setup();
    let order_id = seed_priced_order(&env);

    // 缓存口径是不含运费的 1300
    env.repos
        .order_repo
        .refresh_totals(&order_id, 1500.0, 200.0, 1300.0, None)
        .unwrap();

    let view = env.order_api.order_balance(&order_id).await.unwrap();
    assert_eq!(view.amount, 1450.0); // 1000-200+500-0+150
    assert!(!view.includes_shipping);
    assert!(!view.shipping_pending);
}

#[tokio::test]
async fn test_persisted_figure_with_shipping_is_returned_unchanged() {
    let env = setup();
    let order_id = seed_priced_order(&env);

    // 外部系统已把 1450（含运费）写回持久化口径
    env.repos
        .order_repo
        .refresh_totals(&order_id, 1500.0, 200.0, 1450.0, None)
        .unwrap();

    let view = env.order_api.order_balance(&order_id).await.unwrap();
    assert_eq!(view.amount, 1450.0);
    assert!(view.includes_shipping);

    // 幂等: 重复计算不漂移
    let again = env.order_api.order_balance(&order_id).await.unwrap();
    assert_eq!(again, view);
}

#[tokio::test]
async fn test_fallback_carrier_is_pending() {
    let env = setup();
    let order = OrderBuilder::new("C001").carrier("Otro", "Sucursal").build();
    env.repos.order_repo.insert(&order).unwrap();
    let mut stamp = StampBuilder::new("pending").money(400.0, 100.0).build();
    stamp.order_id = order.order_id.clone();
    env.repos.stamp_repo.insert(&stamp).unwrap();

    let view = env.order_api.order_balance(&order.order_id).await.unwrap();
    assert_eq!(view.amount, 300.0); // 运费按 0 处理
    assert!(view.shipping_pending);
}

#[tokio::test]
async fn test_unknown_route_is_pending_not_error() {
    let env = setup();
    let order = OrderBuilder::new("C001")
        .carrier("Correo Argentino", "Domicilio") // 未定价线路
        .build();
    env.repos.order_repo.insert(&order).unwrap();
    let mut stamp = StampBuilder::new("pending").money(400.0, 0.0).build();
    stamp.order_id = order.order_id.clone();
    env.repos.stamp_repo.insert(&stamp).unwrap();

    let view = env.order_api.order_balance(&order.order_id).await.unwrap();
    assert_eq!(view.amount, 400.0);
    assert!(view.shipping_pending);
}

#[tokio::test]
async fn test_stale_policy_preserve_stored() {
    let env = setup();
    let order_id = seed_priced_order(&env);

    // 旧价目 120 已折入;现价 150
    env.repos
        .order_repo
        .refresh_totals(&order_id, 1500.0, 200.0, 1420.0, None)
        .unwrap();

    // 默认口径: 重算
    let view = env.order_api.order_balance(&order_id).await.unwrap();
    assert_eq!(view.amount, 1450.0);
    assert!(!view.includes_shipping);

    // 切换为保留历史口径
    env.config
        .set_config_value(config_keys::STALE_REMAINING_POLICY, "PRESERVE_STORED")
        .unwrap();
    let view = env.order_api.order_balance(&order_id).await.unwrap();
    assert_eq!(view.amount, 1420.0);
    assert!(view.includes_shipping);
}

#[tokio::test]
async fn test_stamp_balance_uses_item_stored_remaining() {
    let env = setup();
    let order = OrderBuilder::new("C001")
        .carrier("Andreani", "Domicilio")
        .build();
    env.repos.order_repo.insert(&order).unwrap();
    env.repos
        .shipping_rate_repo
        .upsert("Andreani", "Domicilio", 80.0)
        .unwrap();

    let mut stamp = StampBuilder::new("pending").money(600.0, 100.0).build();
    stamp.order_id = order.order_id.clone();
    stamp.stored_remaining = Some(580.0); // 500 + 80 已折入
    env.repos.stamp_repo.insert(&stamp).unwrap();

    let view = env.order_api.stamp_balance(&stamp.stamp_id).await.unwrap();
    assert_eq!(view.amount, 580.0);
    assert!(view.includes_shipping);
}
