use fieldview_core::{
    FieldOverlay, GeoBounds, LatLng, OverlayConfig, OverlayError, PixelPoint, Viewport,
};
use js_sys::Function;
use wasm_bindgen::prelude::*;

fn to_js(err: OverlayError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn serialize<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Viewport backed by the map widget: bounds passed in per redraw and a
/// `project(lat, lng) -> {x, y}` callback.
struct JsViewport<'a> {
    bounds: Option<GeoBounds>,
    project: &'a Function,
}

impl Viewport for JsViewport<'_> {
    fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }

    fn project(&self, at: LatLng) -> fieldview_core::Result<PixelPoint> {
        let out = self
            .project
            .call2(&JsValue::NULL, &JsValue::from_f64(at.lat), &JsValue::from_f64(at.lng))
            .map_err(|e| OverlayError::Projection(format!("{e:?}")))?;
        serde_wasm_bindgen::from_value(out)
            .map_err(|e| OverlayError::Projection(format!("bad projection result: {e}")))
    }
}

/// The field overlay as seen from the dashboard.
#[wasm_bindgen]
pub struct FieldOverlayHandle {
    inner: FieldOverlay,
}

#[wasm_bindgen]
impl FieldOverlayHandle {
    /// `config_json` overrides any subset of the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<FieldOverlayHandle, JsValue> {
        let config = match config_json {
            Some(json) => OverlayConfig::from_json(&json).map_err(to_js)?,
            None => OverlayConfig::default(),
        };
        let inner = FieldOverlay::new(config).map_err(to_js)?;
        Ok(Self { inner })
    }

    /// Load a `{ raw_values, statistics? }` document; returns the ingest report.
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&mut self, json: &str) -> Result<JsValue, JsValue> {
        let report = self.inner.load_document(json).map_err(to_js)?;
        serialize(&report)
    }

    /// Load an array of raw records; returns `{ validCount, rejectedCount, … }`.
    #[wasm_bindgen(js_name = loadSamples)]
    pub fn load_samples(&mut self, records: JsValue) -> Result<JsValue, JsValue> {
        let invalid = || OverlayError::InvalidFieldData("Invalid field data format".into());
        let records: Vec<serde_json::Value> =
            serde_wasm_bindgen::from_value(records).map_err(|_| to_js(invalid()))?;
        let report = self.inner.load_samples(&records).map_err(to_js)?;
        serialize(&report)
    }

    /// Returns the current frame re-tinted to the new opacity, or `null` if
    /// nothing has been drawn yet.
    #[wasm_bindgen(js_name = setOpacity)]
    pub fn set_opacity(&mut self, value: f64) -> Result<JsValue, JsValue> {
        match self.inner.set_opacity(value).map_err(to_js)? {
            Some(frame) => serialize(frame),
            None => Ok(JsValue::NULL),
        }
    }

    /// Compose a frame for the current map view.
    ///
    /// Bounds may be omitted while the map is initialising; the result is then
    /// `null`. Otherwise returns `{ origin, width, height, cellCount, commands }`.
    pub fn redraw(
        &mut self,
        ne_lat: Option<f64>,
        ne_lng: Option<f64>,
        sw_lat: Option<f64>,
        sw_lng: Option<f64>,
        project: &Function,
    ) -> Result<JsValue, JsValue> {
        let bounds = match (ne_lat, ne_lng, sw_lat, sw_lng) {
            (Some(ne_lat), Some(ne_lng), Some(sw_lat), Some(sw_lng)) => Some(GeoBounds::new(
                LatLng::new(sw_lat, sw_lng),
                LatLng::new(ne_lat, ne_lng),
            )),
            _ => None,
        };
        let view = JsViewport { bounds, project };
        match self.inner.redraw(&view).map_err(to_js)? {
            Some(frame) => serialize(frame),
            None => Ok(JsValue::NULL),
        }
    }

    /// Last successful frame, kept on screen after a failed redraw.
    #[wasm_bindgen(js_name = lastFrame)]
    pub fn last_frame(&self) -> Result<JsValue, JsValue> {
        match self.inner.last_frame() {
            Some(frame) => serialize(frame),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = markUnavailable)]
    pub fn mark_unavailable(&mut self, reason: &str) {
        self.inner.mark_unavailable(reason);
    }

    #[wasm_bindgen(getter, js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    #[wasm_bindgen(getter, js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    #[wasm_bindgen(getter, js_name = errorMessage)]
    pub fn error_message(&self) -> Option<String> {
        self.inner.error_message().map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn opacity(&self) -> f64 {
        self.inner.opacity()
    }

    pub fn legend(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.config().color_scale.legend())
    }

    pub fn statistics(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.statistics())
    }

    /// CSS colour for a 0–100 value under this overlay's scale.
    #[wasm_bindgen(js_name = colorForValue)]
    pub fn color_for_value(&self, value: f64) -> String {
        self.inner.config().color_scale.resolve(value).to_css()
    }
}
