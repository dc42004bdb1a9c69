// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

#![allow(dead_code)]

use stamp_oms::domain::order::Order;
use stamp_oms::domain::stamp::Stamp;
use stamp_oms::domain::types::{ProductionState, SaleState, ShippingState};

// ==========================================
// Stamp 构建器
// ==========================================

pub struct StampBuilder {
    stamp: Stamp,
}

impl StampBuilder {
    pub fn new(order_id: &str) -> Self {
        Self {
            stamp: Stamp::new(order_id),
        }
    }

    pub fn id(mut self, stamp_id: &str) -> Self {
        self.stamp.stamp_id = stamp_id.to_string();
        self
    }

    pub fn production(mut self, production: ProductionState) -> Self {
        self.stamp.production = production;
        self
    }

    pub fn sale_state(mut self, sale_state: SaleState) -> Self {
        self.stamp.sale_state = sale_state;
        self
    }

    pub fn shipping_state(mut self, shipping_state: ShippingState) -> Self {
        self.stamp.shipping_state = shipping_state;
        self
    }

    pub fn priority(mut self, flag: bool) -> Self {
        self.stamp.is_priority = flag;
        self
    }

    pub fn machine(mut self, machine: &str) -> Self {
        self.stamp.machine = Some(machine.to_string());
        self
    }

    pub fn program(mut self, program: &str) -> Self {
        self.stamp.program = Some(program.to_string());
        self
    }

    pub fn dimensions(mut self, width_cm: f64, height_cm: f64) -> Self {
        self.stamp.width_cm = Some(width_cm);
        self.stamp.height_cm = Some(height_cm);
        self
    }

    pub fn money(mut self, value: f64, deposit: f64) -> Self {
        self.stamp.value = value;
        self.stamp.deposit = deposit;
        self
    }

    pub fn build(self) -> Stamp {
        self.stamp
    }
}

// ==========================================
// Order 构建器
// ==========================================

pub struct OrderBuilder {
    order: Order,
}

impl OrderBuilder {
    pub fn new(customer_id: &str) -> Self {
        Self {
            order: Order::new(customer_id),
        }
    }

    pub fn id(mut self, order_id: &str) -> Self {
        self.order.order_id = order_id.to_string();
        self
    }

    pub fn carrier(mut self, carrier: &str, service: &str) -> Self {
        self.order.carrier = Some(carrier.to_string());
        self.order.service = Some(service.to_string());
        self
    }

    pub fn build(self) -> Order {
        self.order
    }
}
