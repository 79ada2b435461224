use serde_json::{json, Value};

use super::BusinessInfo;

/// Build the generation prompt. The model is asked for a strict JSON
/// object: a color palette plus content for every site section.
pub fn build_prompt(info: &BusinessInfo) -> String {
    let language = if info.language == "english" {
        "English"
    } else {
        "Vietnamese"
    };

    format!(
        r##"You are a website design and branding expert. Create content and a color palette for a business website from the following brief.

BUSINESS:
- Company name: {company}
- Industry: {industry}
- Description: {description}
- Target audience: {audience}
- Products/Services: {services}
- Location: {location}
- Tone of voice: {tone}
- Language: {language}

REQUIREMENTS:
1. ALL website copy must be written in {language}. Never mix languages within a section.
2. Choose a palette that fits the industry and brand (greens for agriculture, warm browns for coffee, blues for technology, and so on).
3. Fill every section completely; no placeholders, no generic filler.
4. Match the requested tone of voice.

Return EXACTLY the following JSON shape, with no markdown fences or commentary:

{{
  "colors": {{
    "primary": "#hex", "secondary": "#hex", "accent": "#hex",
    "background": "#hex", "text": "#hex", "border": "#hex"
  }},
  "content": {{
    "header": {{ "title": "{company}", "subtitle": "short slogan", "navigation": [{{"name": "...", "href": "#home"}}] }},
    "hero": {{ "title": "...", "subtitle": "...", "description": "...", "ctaText": "...", "ctaSecondaryText": "...",
               "benefits": [{{"icon": "CheckCircle", "text": "..."}}],
               "stats": [{{"number": "100+", "label": "..."}}] }},
    "about": {{ "title": "...", "description": "...", "features": [{{"icon": "Award", "title": "...", "description": "..."}}] }},
    "problems": {{ "title": "...", "description": "...", "items": [{{"id": "1", "title": "...", "description": "...", "icon": "AlertTriangle"}}] }},
    "solutions": {{ "title": "...", "description": "...", "items": [{{"id": "1", "title": "...", "description": "...", "benefit": "...", "icon": "Globe"}}] }},
    "products": {{ "title": "...", "description": "...", "items": [{{"id": "1", "name": "...", "description": "...", "price": "...", "features": ["..."]}}] }},
    "whyChooseUs": {{ "title": "...", "subtitle": "...", "strengths": [{{"icon": "Award", "title": "...", "description": "..."}}] }},
    "testimonials": {{ "title": "...", "subtitle": "...", "testimonials": [{{"id": "1", "name": "...", "title": "...", "company": "...", "content": "...", "rating": 5}}] }},
    "footer": {{ "companyName": "{company}", "description": "...",
                 "contact": {{ "phone": "...", "email": "...", "address": "...", "businessHours": "..." }} }}
  }}
}}"##,
        company = info.company_name,
        industry = info.industry,
        description = info.description,
        audience = info.target_audience.as_deref().unwrap_or("Not specified"),
        services = info.services.as_deref().unwrap_or("Not specified"),
        location = info.location.as_deref().unwrap_or("Vietnam"),
        tone = info.tone,
        language = language,
    )
}

/// Parse the model's reply. Models wrap JSON in code fences or trail off
/// mid-object often enough that this tries, in order: raw parse, fence
/// stripping, outermost-braces extraction, closing-brace repair, and
/// finally a deterministic fallback built from the brief itself.
pub fn parse_generated(text: &str, info: &BusinessInfo) -> Value {
    let cleaned = text
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string();

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return value;
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            let candidate = &cleaned[start..=end];
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                return value;
            }

            let open = candidate.matches('{').count();
            let close = candidate.matches('}').count();
            if open > close {
                let repaired = format!("{}{}", candidate, "}".repeat(open - close));
                if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                    tracing::debug!("Repaired truncated AI JSON ({} braces)", open - close);
                    return value;
                }
            }
        }
    }

    tracing::warn!("AI reply was not parseable JSON; using fallback content");
    fallback_theme_data(info)
}

/// Deterministic stand-in used when the model's output cannot be parsed.
pub fn fallback_theme_data(info: &BusinessInfo) -> Value {
    let en = info.language == "english";
    let t = |english: &str, vietnamese: &str| {
        if en { english.to_string() } else { vietnamese.to_string() }
    };

    json!({
        "colors": {
            "primary": "#007bff",
            "secondary": "#6c757d",
            "accent": "#28a745",
            "background": "#FFFFFF",
            "text": "#2D3748",
            "border": "#E2E8F0"
        },
        "content": {
            "header": {
                "title": info.company_name,
                "subtitle": t("Professional Solutions", "Giải pháp chuyên nghiệp"),
                "navigation": [
                    { "name": t("Home", "Trang chủ"), "href": "#home" },
                    { "name": t("Products", "Sản phẩm"), "href": "#products" },
                    { "name": t("About Us", "Về chúng tôi"), "href": "#about" },
                    { "name": t("Contact", "Liên hệ"), "href": "#contact" }
                ]
            },
            "hero": {
                "title": if en {
                    format!("Welcome to {}", info.company_name)
                } else {
                    format!("Chào mừng đến với {}", info.company_name)
                },
                "subtitle": info.description,
                "description": info.description,
                "ctaText": t("Get Started", "Bắt đầu"),
                "ctaSecondaryText": t("Learn More", "Tìm hiểu thêm"),
                "benefits": [
                    { "icon": "CheckCircle", "text": t("Quality Service", "Dịch vụ chất lượng") },
                    { "icon": "Shield", "text": t("Reliable", "Đáng tin cậy") }
                ],
                "stats": [
                    { "number": "100+", "label": t("Customers", "Khách hàng") },
                    { "number": "24/7", "label": t("Support", "Hỗ trợ") }
                ]
            },
            "about": {
                "title": t("About Us", "Về Chúng Tôi"),
                "description": info.description,
                "features": []
            },
            "problems": { "title": t("Current Challenges", "Thách Thức Hiện Tại"), "description": "", "items": [] },
            "solutions": { "title": t("Our Solutions", "Giải Pháp Của Chúng Tôi"), "description": "", "items": [] },
            "products": { "title": t("Our Products", "Sản Phẩm Của Chúng Tôi"), "description": "", "items": [] },
            "whyChooseUs": {
                "title": if en {
                    format!("Why Choose {}?", info.company_name)
                } else {
                    format!("Tại Sao Chọn {}?", info.company_name)
                },
                "subtitle": "",
                "strengths": []
            },
            "testimonials": { "title": t("What Our Customers Say", "Khách Hàng Nói Gì Về Chúng Tôi"), "subtitle": "", "testimonials": [] },
            "footer": {
                "companyName": info.company_name,
                "description": t("Professional services", "Dịch vụ chuyên nghiệp"),
                "contact": { "phone": "", "email": "", "address": "", "businessHours": "" }
            }
        }
    })
}

/// Merge generated colors/content over the project's current theme
/// params. Generated colors win; typography, layout and component styles
/// stay with the current theme (or sensible defaults).
pub fn prepare_theme_params(generated: &Value, current: &Value) -> Value {
    let mut colors = current
        .get("colors")
        .cloned()
        .unwrap_or_else(|| json!({}));
    if let (Some(base), Some(overlay)) = (colors.as_object_mut(), generated["colors"].as_object()) {
        for (key, value) in overlay {
            base.insert(key.clone(), value.clone());
        }
    }

    let mut content = current
        .get("content")
        .cloned()
        .unwrap_or_else(|| json!({}));
    if let (Some(base), Some(overlay)) = (content.as_object_mut(), generated["content"].as_object())
    {
        for (key, value) in overlay {
            base.insert(key.clone(), value.clone());
        }
    }

    json!({
        "colors": colors,
        "typography": current.get("typography").cloned().unwrap_or_else(|| json!({
            "fontFamily": "Inter",
            "headingSize": "xl",
            "bodySize": "base",
            "lineHeight": "1.6"
        })),
        "layout": current.get("layout").cloned().unwrap_or_else(|| json!({
            "containerWidth": "1200px",
            "sectionSpacing": "80px",
            "borderRadius": "8px"
        })),
        "components": current.get("components").cloned().unwrap_or_else(|| json!({
            "button": { "style": "solid", "size": "medium", "rounded": true },
            "card": { "shadow": "medium", "border": true }
        })),
        "content": content,
    })
}
