pub mod export;

use askama::Template;
use serde_json::Value;

/// One rendered tenant page. Built from a ProjectVersion snapshot and fed
/// to both live serving and the static export bundle.
#[derive(Template)]
#[template(path = "site/page.html")]
pub struct SiteView {
    /// Inline CSS/JS when serving live; link external files in exports.
    pub standalone: bool,
    pub css: String,
    pub js: String,
    pub project_id: String,
    pub leads_endpoint: String,
    pub meta_title: String,
    pub meta_description: String,
    pub company_name: String,
    pub tagline: String,
    pub nav: Vec<NavLink>,
    pub hero: HeroView,
    pub about: AboutView,
    pub problems: CardSection,
    pub solutions: CardSection,
    pub products: ProductSection,
    pub why_choose_us: FeatureSection,
    pub testimonials: TestimonialSection,
    pub lead_form: LeadFormView,
    pub footer: FooterView,
}

pub struct NavLink {
    pub name: String,
    pub href: String,
}

pub struct HeroView {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub cta_text: String,
    pub cta_secondary_text: String,
    pub benefits: Vec<String>,
    pub stats: Vec<Stat>,
}

pub struct Stat {
    pub number: String,
    pub label: String,
}

pub struct AboutView {
    pub title: String,
    pub description: String,
    pub features: Vec<Feature>,
}

pub struct Feature {
    pub title: String,
    pub description: String,
}

pub struct CardSection {
    pub title: String,
    pub description: String,
    pub items: Vec<Card>,
}

pub struct Card {
    pub title: String,
    pub description: String,
    pub benefit: String,
}

pub struct ProductSection {
    pub title: String,
    pub description: String,
    pub items: Vec<ProductView>,
}

pub struct ProductView {
    pub name: String,
    pub description: String,
    pub price: String,
    pub features: Vec<String>,
}

pub struct FeatureSection {
    pub title: String,
    pub subtitle: String,
    pub features: Vec<Feature>,
}

pub struct TestimonialSection {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<TestimonialView>,
}

pub struct TestimonialView {
    pub name: String,
    pub title: String,
    pub company: String,
    pub content: String,
}

pub struct LeadFormView {
    pub title: String,
    pub description: String,
    pub button_text: String,
}

pub struct FooterView {
    pub company_name: String,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub business_hours: String,
}

/// Build the page view from a snapshot. Missing sections render with
/// sensible defaults rather than failing the whole page.
pub fn build_view(
    project_name: &str,
    project_id: &str,
    snapshot: &Value,
    standalone: bool,
    leads_endpoint: &str,
) -> SiteView {
    let content = &snapshot["content"];
    let company_name = text_or(&content["header"]["title"], project_name);

    SiteView {
        standalone,
        css: generate_css(snapshot),
        js: site_js(),
        project_id: project_id.to_string(),
        leads_endpoint: leads_endpoint.to_string(),
        meta_title: text_or(&content["meta"]["title"], &company_name),
        meta_description: text_or(
            &content["meta"]["description"],
            &text_or(&content["hero"]["description"], ""),
        ),
        company_name: company_name.clone(),
        tagline: text_or(&content["header"]["subtitle"], ""),
        nav: array(&content["header"]["navigation"])
            .iter()
            .map(|item| NavLink {
                name: text_or(&item["name"], ""),
                href: text_or(&item["href"], "#"),
            })
            .filter(|link| !link.name.is_empty())
            .collect(),
        hero: HeroView {
            title: text_or(&content["hero"]["title"], &company_name),
            subtitle: text_or(&content["hero"]["subtitle"], ""),
            description: text_or(&content["hero"]["description"], ""),
            cta_text: text_or(&content["hero"]["ctaText"], "Contact us"),
            cta_secondary_text: text_or(&content["hero"]["ctaSecondaryText"], ""),
            benefits: array(&content["hero"]["benefits"])
                .iter()
                .filter_map(|b| b["text"].as_str().map(|s| s.to_string()))
                .collect(),
            stats: array(&content["hero"]["stats"])
                .iter()
                .map(|s| Stat {
                    number: text_or(&s["number"], ""),
                    label: text_or(&s["label"], ""),
                })
                .collect(),
        },
        about: AboutView {
            title: text_or(&content["about"]["title"], "About Us"),
            description: text_or(&content["about"]["description"], ""),
            features: features(&content["about"]["features"]),
        },
        problems: card_section(&content["problems"], "Challenges"),
        solutions: card_section(&content["solutions"], "Solutions"),
        products: ProductSection {
            title: text_or(&content["products"]["title"], "Products"),
            description: text_or(&content["products"]["description"], ""),
            items: array(&content["products"]["items"])
                .iter()
                .map(|item| ProductView {
                    name: text_or(&item["name"], ""),
                    description: text_or(&item["description"], ""),
                    price: text_or(&item["price"], ""),
                    features: array(&item["features"])
                        .iter()
                        .filter_map(|f| f.as_str().map(|s| s.to_string()))
                        .collect(),
                })
                .filter(|p| !p.name.is_empty())
                .collect(),
        },
        why_choose_us: FeatureSection {
            title: text_or(&content["whyChooseUs"]["title"], ""),
            subtitle: text_or(&content["whyChooseUs"]["subtitle"], ""),
            features: features(&content["whyChooseUs"]["strengths"]),
        },
        testimonials: TestimonialSection {
            title: text_or(&content["testimonials"]["title"], ""),
            subtitle: text_or(&content["testimonials"]["subtitle"], ""),
            items: array(&content["testimonials"]["testimonials"])
                .iter()
                .map(|t| TestimonialView {
                    name: text_or(&t["name"], ""),
                    title: text_or(&t["title"], ""),
                    company: text_or(&t["company"], ""),
                    content: text_or(&t["content"], ""),
                })
                .filter(|t| !t.content.is_empty())
                .collect(),
        },
        lead_form: LeadFormView {
            title: text_or(&content["leadMagnet"]["formTitle"], "Get in touch"),
            description: text_or(&content["leadMagnet"]["formDescription"], ""),
            button_text: text_or(&content["leadMagnet"]["buttonText"], "Send"),
        },
        footer: FooterView {
            company_name: text_or(&content["footer"]["companyName"], &company_name),
            description: text_or(&content["footer"]["description"], ""),
            phone: text_or(&content["footer"]["contact"]["phone"], ""),
            email: text_or(&content["footer"]["contact"]["email"], ""),
            address: text_or(&content["footer"]["contact"]["address"], ""),
            business_hours: text_or(&content["footer"]["contact"]["businessHours"], ""),
        },
    }
}

pub fn render_page(view: &SiteView) -> Result<String, String> {
    view.render().map_err(|e| format!("Template error: {e}"))
}

/// Derive the stylesheet from theme params: custom properties for the
/// palette plus layout/typography rules.
pub fn generate_css(snapshot: &Value) -> String {
    let colors = &snapshot["colors"];
    let typography = &snapshot["typography"];
    let layout = &snapshot["layout"];

    let primary = text_or(&colors["primary"], "#2563eb");
    let secondary = text_or(&colors["secondary"], "#64748b");
    let accent = text_or(&colors["accent"], "#0ea5e9");
    let background = text_or(&colors["background"], "#ffffff");
    let text = text_or(&colors["text"], "#1e293b");
    let border = text_or(&colors["border"], "#e2e8f0");

    let font_family = text_or(&typography["fontFamily"], "Inter");
    let line_height = text_or(&typography["lineHeight"], "1.6");
    let container_width = text_or(&layout["containerWidth"], "1200px");
    let section_spacing = text_or(&layout["sectionSpacing"], "80px");
    let border_radius = text_or(&layout["borderRadius"], "8px");

    format!(
        r#":root {{
  --color-primary: {primary};
  --color-secondary: {secondary};
  --color-accent: {accent};
  --color-background: {background};
  --color-text: {text};
  --color-border: {border};
  --font-family: '{font_family}', system-ui, sans-serif;
  --line-height: {line_height};
  --container-width: {container_width};
  --section-spacing: {section_spacing};
  --border-radius: {border_radius};
}}
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
body {{
  font-family: var(--font-family);
  line-height: var(--line-height);
  color: var(--color-text);
  background: var(--color-background);
}}
.container {{ max-width: var(--container-width); margin: 0 auto; padding: 0 1.5rem; }}
section {{ padding: var(--section-spacing) 0; }}
header.site-header {{
  background: var(--color-primary);
  color: #fff;
  position: sticky;
  top: 0;
  z-index: 10;
}}
header.site-header .container {{ display: flex; align-items: center; justify-content: space-between; padding-top: 1rem; padding-bottom: 1rem; }}
header.site-header nav a {{ color: #fff; text-decoration: none; margin-left: 1.25rem; }}
.hero {{ background: var(--color-secondary); color: #fff; text-align: center; }}
.hero h1 {{ font-size: 2.5rem; margin-bottom: 0.75rem; }}
.hero .subtitle {{ font-size: 1.25rem; opacity: 0.9; }}
.hero .cta {{ display: inline-block; margin-top: 1.5rem; padding: 0.75rem 2rem; background: var(--color-accent); color: #fff; text-decoration: none; border-radius: var(--border-radius); }}
.hero .cta.secondary {{ background: transparent; border: 1px solid #fff; margin-left: 0.75rem; }}
.stats {{ display: flex; justify-content: center; gap: 3rem; margin-top: 2.5rem; }}
.stats .number {{ font-size: 1.75rem; font-weight: 700; }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 1.5rem; margin-top: 2rem; }}
.card {{ background: var(--color-background); border: 1px solid var(--color-border); border-radius: var(--border-radius); padding: 1.5rem; }}
.card h3 {{ margin-bottom: 0.5rem; }}
.card .benefit {{ color: var(--color-accent); font-weight: 600; margin-top: 0.75rem; }}
.section-title {{ font-size: 2rem; text-align: center; }}
.section-subtitle {{ text-align: center; color: var(--color-secondary); margin-top: 0.5rem; }}
.testimonial {{ font-style: italic; }}
.testimonial .author {{ font-style: normal; font-weight: 600; margin-top: 1rem; }}
.lead-form {{ max-width: 480px; margin: 2rem auto 0; display: grid; gap: 0.75rem; }}
.lead-form input, .lead-form textarea {{ padding: 0.75rem; border: 1px solid var(--color-border); border-radius: var(--border-radius); font: inherit; }}
.lead-form button {{ padding: 0.75rem; background: var(--color-primary); color: #fff; border: 0; border-radius: var(--border-radius); cursor: pointer; }}
.form-status {{ text-align: center; margin-top: 0.75rem; min-height: 1.25rem; }}
footer.site-footer {{ background: var(--color-text); color: var(--color-background); padding: 3rem 0; }}
footer.site-footer .contact p {{ margin-top: 0.25rem; opacity: 0.85; }}
"#
    )
}

/// Lead-capture form handler shipped with every site.
pub fn site_js() -> String {
    r#"document.addEventListener('DOMContentLoaded', function () {
  var form = document.getElementById('lead-form');
  if (!form) return;
  form.addEventListener('submit', function (event) {
    event.preventDefault();
    var status = document.getElementById('form-status');
    var data = {
      projectId: form.dataset.projectId,
      name: form.elements['name'].value,
      email: form.elements['email'].value,
      company: form.elements['company'] ? form.elements['company'].value : '',
      message: form.elements['message'] ? form.elements['message'].value : ''
    };
    fetch(form.action, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(data)
    }).then(function (response) {
      if (response.ok) {
        form.reset();
        status.textContent = 'Thank you! We will be in touch shortly.';
      } else {
        status.textContent = 'Something went wrong. Please try again.';
      }
    }).catch(function () {
      status.textContent = 'Something went wrong. Please try again.';
    });
  });
});
"#
    .to_string()
}

fn card_section(section: &Value, default_title: &str) -> CardSection {
    CardSection {
        title: text_or(&section["title"], default_title),
        description: text_or(&section["description"], ""),
        items: array(&section["items"])
            .iter()
            .map(|item| Card {
                title: text_or(&item["title"], ""),
                description: text_or(&item["description"], ""),
                benefit: text_or(&item["benefit"], ""),
            })
            .filter(|card| !card.title.is_empty())
            .collect(),
    }
}

fn features(value: &Value) -> Vec<Feature> {
    array(value)
        .iter()
        .map(|item| Feature {
            title: text_or(&item["title"], ""),
            description: text_or(&item["description"], ""),
        })
        .filter(|f| !f.title.is_empty())
        .collect()
}

fn text_or(value: &Value, default: &str) -> String {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn array(value: &Value) -> Vec<Value> {
    value.as_array().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> Value {
        json!({
            "colors": { "primary": "#8B4513", "background": "#F5F5DC" },
            "typography": { "fontFamily": "Georgia" },
            "layout": { "containerWidth": "960px" },
            "content": {
                "header": {
                    "title": "Highland Beans",
                    "subtitle": "Specialty coffee",
                    "navigation": [ { "name": "Home", "href": "#home" } ]
                },
                "hero": {
                    "title": "Coffee from Dalat",
                    "description": "Farm to cup",
                    "ctaText": "Order now",
                    "stats": [ { "number": "15+", "label": "Years" } ]
                },
                "products": {
                    "title": "Our beans",
                    "items": [
                        { "name": "Arabica", "description": "Washed", "price": "$12", "features": ["Single origin"] }
                    ]
                },
                "footer": {
                    "companyName": "Highland Beans",
                    "contact": { "email": "hello@highland.example" }
                }
            }
        })
    }

    #[test]
    fn view_pulls_sections_from_snapshot() {
        let view = build_view("Fallback", "pid", &snapshot(), true, "/v1/leads");
        assert_eq!(view.company_name, "Highland Beans");
        assert_eq!(view.hero.title, "Coffee from Dalat");
        assert_eq!(view.products.items.len(), 1);
        assert_eq!(view.nav.len(), 1);
    }

    #[test]
    fn missing_sections_fall_back() {
        let view = build_view("My Site", "pid", &json!({}), true, "/v1/leads");
        assert_eq!(view.company_name, "My Site");
        assert_eq!(view.hero.title, "My Site");
        assert!(view.products.items.is_empty());
    }

    #[test]
    fn css_uses_theme_colors() {
        let css = generate_css(&snapshot());
        assert!(css.contains("--color-primary: #8B4513"));
        assert!(css.contains("'Georgia'"));
        assert!(css.contains("--container-width: 960px"));
    }

    #[test]
    fn page_renders_with_form_wired_to_project() {
        let view = build_view("Fallback", "p-123", &snapshot(), true, "/v1/leads");
        let html = render_page(&view).unwrap();
        assert!(html.contains("Highland Beans"));
        assert!(html.contains("data-project-id=\"p-123\""));
        assert!(html.contains("action=\"/v1/leads\""));
        assert!(html.contains("<style>"));
    }

    #[test]
    fn export_page_links_assets_instead_of_inlining() {
        let view = build_view("Fallback", "p-123", &snapshot(), false, "https://example.com/v1/leads");
        let html = render_page(&view).unwrap();
        assert!(html.contains("styles.css"));
        assert!(html.contains("site.js"));
        assert!(!html.contains("<style>"));
    }
}
