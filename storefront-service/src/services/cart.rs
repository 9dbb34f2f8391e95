use crate::models::CartItem;

/// Merges a client cart into the stored one.
///
/// Lines are keyed by product. A product present on both sides keeps the
/// larger quantity; client-only lines are appended in client order. Stored
/// line order is preserved and quantities are at least 1.
pub fn merge_carts(server: &[CartItem], client: &[CartItem]) -> Vec<CartItem> {
    let mut merged: Vec<CartItem> = Vec::with_capacity(server.len() + client.len());

    for item in server.iter().chain(client.iter()) {
        let qty = item.qty.max(1);
        match merged.iter_mut().find(|m| m.product == item.product) {
            Some(existing) => existing.qty = existing.qty.max(qty),
            None => merged.push(CartItem {
                qty,
                ..item.clone()
            }),
        }
    }

    merged
}
