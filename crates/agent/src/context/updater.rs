//! Maps a fused bundle back into frame updates.

use fieldvoice_core::bundle::DataBundle;
use fieldvoice_core::chemical::ChemicalSearchResult;
use fieldvoice_core::context::ContextUpdate;
use fieldvoice_core::vision::VisionResult;

/// Frame updates for one turn, in application order.
///
/// Vision-derived entries come first so that freshly fetched crop, pest and
/// chemical data from the bundle win under last-write-wins.
pub fn prepare_context_updates(
    bundle: &DataBundle,
    vision: Option<&VisionResult>,
) -> Vec<ContextUpdate> {
    let mut updates = Vec::new();

    if let Some(vision) = vision {
        updates.push(ContextUpdate::Vision(vision.clone()));

        if let Some(crop) = &vision.crop {
            updates.push(ContextUpdate::Crop(crop.clone()));
        }
        if let Some(pest) = &vision.pest {
            updates.push(ContextUpdate::Pest(pest.clone()));
        }
        if let Some(chemical) = &vision.chemical {
            updates.push(ContextUpdate::Chemical(ChemicalSearchResult {
                answer: String::new(),
                success: true,
                products: vec![chemical.clone()],
                best_match: Some(chemical.clone()),
            }));
        }
    }

    if let Some(weather) = bundle.weather().filter(|w| !w.is_null()) {
        updates.push(ContextUpdate::Weather(weather.clone()));
    }

    if let Some(chemical) = bundle.chemical() {
        updates.push(ContextUpdate::Chemical(chemical.clone()));
    }

    if let Some(crop) = bundle.crop() {
        updates.push(ContextUpdate::Crop(crop.clone()));
    }

    if let Some(pest) = bundle.pest() {
        updates.push(ContextUpdate::Pest(pest.clone()));
    }

    if let Some(memory) = bundle.memory() {
        updates.push(ContextUpdate::Memory(memory.to_vec()));
    }

    updates
}
