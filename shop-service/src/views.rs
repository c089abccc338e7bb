//! Row models to wire DTOs.

use bigdecimal::BigDecimal;
use num_traits::Zero;
use shared::*;

use crate::models::*;

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            // constrained by a CHECK on the column
            role: user.role.parse().unwrap_or(UserRole::Customer),
            is_active: user.is_active,
        }
    }
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        CategoryResponse {
            id: category.id,
            name: category.name,
            description: category.description,
            is_active: category.is_active,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

impl From<ProductImage> for ProductImageResponse {
    fn from(image: ProductImage) -> Self {
        ProductImageResponse {
            id: image.id,
            url: image.url,
            alt_text: image.alt_text,
            is_primary: image.is_primary,
            created_at: image.created_at,
        }
    }
}

impl From<ProductDetail> for ProductResponse {
    fn from(detail: ProductDetail) -> Self {
        let ProductDetail { product, category, images } = detail;
        ProductResponse {
            id: product.id,
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            sku: product.sku,
            is_active: product.is_active,
            category: category.into(),
            images: images.into_iter().map(Into::into).collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<CartDetail> for CartResponse {
    fn from(detail: CartDetail) -> Self {
        let mut total = BigDecimal::zero();
        let cart_items = detail
            .lines
            .into_iter()
            .map(|line| {
                let subtotal = &line.product.product.price * BigDecimal::from(line.item.quantity);
                total += &subtotal;
                CartItemResponse {
                    id: line.item.id,
                    product: line.product.into(),
                    quantity: line.item.quantity,
                    subtotal,
                }
            })
            .collect();

        CartResponse {
            id: detail.cart.id,
            user_id: detail.cart.user_id,
            cart_items,
            total,
        }
    }
}

impl From<OrderDetail> for OrderResponse {
    fn from(detail: OrderDetail) -> Self {
        let OrderDetail { order, lines } = detail;
        OrderResponse {
            id: order.id,
            user_id: order.user_id,
            status: order.status.parse().unwrap_or(OrderStatus::Pending),
            total_amount: order.total_amount,
            order_items: lines
                .into_iter()
                .map(|line| OrderItemResponse {
                    id: line.item.id,
                    quantity: line.item.quantity,
                    price: line.item.price,
                    created_at: line.item.created_at,
                    product: line.product.into(),
                })
                .collect(),
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    #[test]
    fn cart_total_is_live_sum_of_subtotals() {
        let now = Utc::now();
        let category = Category {
            id: 1,
            name: "Tea".into(),
            description: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let line = |id: i32, price: &str, quantity: i32| CartLine {
            item: CartItem {
                id,
                cart_id: 3,
                product_id: id,
                quantity,
                created_at: now,
                updated_at: now,
            },
            product: ProductDetail {
                product: Product {
                    id,
                    category_id: 1,
                    name: format!("P{id}"),
                    description: String::new(),
                    price: BigDecimal::from_str(price).unwrap(),
                    stock: 10,
                    sku: format!("S{id}"),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                },
                category: category.clone(),
                images: vec![],
            },
        };

        let response = CartResponse::from(CartDetail {
            cart: Cart {
                id: 3,
                user_id: 8,
                created_at: now,
                updated_at: now,
            },
            lines: vec![line(1, "2.50", 4), line(2, "0.99", 1)],
        });

        assert_eq!(response.cart_items[0].subtotal, BigDecimal::from_str("10.00").unwrap());
        assert_eq!(response.total, BigDecimal::from_str("10.99").unwrap());
        assert_eq!(response.user_id, 8);
    }
}
