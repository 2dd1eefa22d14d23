use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
}

/// The four headshot variants, in the order a batch generates them.
pub static STYLE_CATALOG: [StyleDescriptor; 4] = [
    StyleDescriptor {
        key: "corporate",
        label: "Corporate Studio",
        prompt: "Professional corporate headshot. Preserve the same identity and face from the reference photo. Business formal attire, clean neutral studio background, realistic skin texture, balanced lighting, no text, no watermark.",
    },
    StyleDescriptor {
        key: "linkedin",
        label: "Modern LinkedIn",
        prompt: "Modern LinkedIn profile photo. Preserve the same identity and face from the reference photo. Smart business-casual styling, subtle office blur background, approachable expression, realistic photo quality, no text, no watermark.",
    },
    StyleDescriptor {
        key: "resume",
        label: "Minimal Resume",
        prompt: "Minimal resume-ready portrait. Preserve the same identity and face from the reference photo. Clean plain light-gray background, professional attire, centered crop, realistic and crisp, no text, no watermark.",
    },
    StyleDescriptor {
        key: "creative",
        label: "Creative Professional",
        prompt: "Creative but professional avatar. Preserve the same identity and face from the reference photo. Stylish business-appropriate outfit, subtle premium gradient background, soft cinematic light, realistic output, no text, no watermark.",
    },
];

impl StyleDescriptor {
    pub fn by_key(key: &str) -> Option<&'static StyleDescriptor> {
        STYLE_CATALOG.iter().find(|style| style.key == key)
    }

    pub fn download_name(&self) -> String {
        format!("avatar-{}.png", self.key)
    }
}
