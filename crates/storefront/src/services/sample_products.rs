//! Sample spice catalog used to initialize an empty store.

use rust_decimal::Decimal;

use crate::models::{NewProduct, product::DEFAULT_STOCK_QUANTITY};

const CHILI_IMAGE: &str = "https://images.unsplash.com/photo-1596213812143-ff89bd9ddecd?crop=entropy&cs=srgb&fm=jpg&ixid=M3w3NDk1Nzh8MHwxfHNlYXJjaHwzfHxzcGljZXN8ZW58MHx8fG9yYW5nZXwxNzU0MzgzOTQwfDA&ixlib=rb-4.1.0&q=85";

/// (name, description, price in cents, category, weight, image, featured)
const SAMPLES: [(&str, &str, i64, &str, &str, &str, bool); 6] = [
    (
        "Premium Red Chili Powder",
        "Authentic red chili powder made from the finest quality chilies. Perfect for adding heat and flavor to your dishes.",
        1299,
        "Powders",
        "250g",
        CHILI_IMAGE,
        true,
    ),
    (
        "Organic Turmeric Powder",
        "Pure organic turmeric powder with anti-inflammatory properties. Essential for healthy cooking and traditional recipes.",
        1599,
        "Powders",
        "200g",
        "https://images.unsplash.com/photo-1613216514014-edb92d8e3e8d?crop=entropy&cs=srgb&fm=jpg&ixid=M3w3NDk1Nzh8MHwxfHNlYXJjaHwzfHx0dXJtZXJpYyUyMHBvd2RlcnxlbnwwfHx8b3JhbmdlfDE3NTQzODM5NDZ8MA&ixlib=rb-4.1.0&q=85",
        true,
    ),
    (
        "Coriander Powder",
        "Freshly ground coriander seeds with a citrusy aroma. Essential for Indian and Mediterranean cuisine.",
        899,
        "Powders",
        "150g",
        "https://images.pexels.com/photos/8858686/pexels-photo-8858686.jpeg",
        false,
    ),
    (
        "Garam Masala Blend",
        "Traditional blend of warming spices including cardamom, cinnamon, cloves, and black pepper.",
        1899,
        "Blends",
        "100g",
        "https://images.unsplash.com/photo-1661022166287-1d1ae8dfaec4?crop=entropy&cs=srgb&fm=jpg&ixid=M3w3NDk1Nzh8MHwxfHNlYXJjaHwyfHxzcGljZXN8ZW58MHx8fG9yYW5nZXwxNzU0MzgzOTQwfDA&ixlib=rb-4.1.0&q=85",
        true,
    ),
    (
        "Black Pepper Powder",
        "Freshly ground black peppercorns with intense flavor and aroma. The king of spices for your kitchen.",
        2299,
        "Powders",
        "100g",
        "https://images.pexels.com/photos/13705489/pexels-photo-13705489.jpeg",
        false,
    ),
    (
        "Cumin Powder",
        "Earthy and warm cumin powder ground from premium cumin seeds. Perfect for curries and spice blends.",
        1099,
        "Powders",
        "200g",
        CHILI_IMAGE,
        false,
    ),
];

/// The sample products, in insertion order.
pub fn sample_products() -> Vec<NewProduct> {
    SAMPLES
        .iter()
        .map(
            |&(name, description, price, category, weight, image_url, featured)| NewProduct {
                name: name.to_string(),
                description: description.to_string(),
                price: Decimal::new(price, 2),
                category: category.to_string(),
                weight: weight.to_string(),
                image_url: image_url.to_string(),
                stock_quantity: DEFAULT_STOCK_QUANTITY,
                featured,
            },
        )
        .collect()
}
